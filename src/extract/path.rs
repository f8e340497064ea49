//! Path variable descriptors.

use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::{BoxError, Result};
use crate::extract::convert::{self, Converter};
use crate::extract::param::{Failure, Param};
use crate::extract::{Extractor, invalid, missing};
use crate::request::Request;

/// A named path variable converted to `U`, extracted as `T`.
///
/// The hosting router guarantees the variable exists for the matched route;
/// a descriptor naming a variable the route does not have reports it missing.
pub struct PathVariable<U, T = U>(Param<U, T>);

impl<U, T> Clone for PathVariable<U, T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

fn typed<U: 'static>(name: &str, converter: Converter<U>) -> PathVariable<U> {
    PathVariable(Param::new(name, converter))
}

/// The raw string value.
pub fn path_var(name: &str) -> PathVariable<String> {
    typed(name, convert::string())
}

pub fn int_var(name: &str) -> PathVariable<i32> {
    typed(name, convert::from_str())
}

pub fn long_var(name: &str) -> PathVariable<i64> {
    typed(name, convert::from_str())
}

pub fn float_var(name: &str) -> PathVariable<f32> {
    typed(name, convert::from_str())
}

pub fn double_var(name: &str) -> PathVariable<f64> {
    typed(name, convert::from_str())
}

pub fn bool_var(name: &str) -> PathVariable<bool> {
    typed(name, convert::from_str())
}

pub fn big_int_var(name: &str) -> PathVariable<i128> {
    typed(name, convert::from_str())
}

/// A unit enum variant, matched by its exact serde name.
pub fn enum_var<E: DeserializeOwned + 'static>(name: &str) -> PathVariable<E> {
    path_var(name).enumerated()
}

impl<U: 'static> PathVariable<U> {
    /// Converts the value further with `f`.
    pub fn convert<V, E, F>(self, f: F) -> PathVariable<V>
    where
        V: 'static,
        E: Into<BoxError>,
        F: Fn(U) -> std::result::Result<V, E> + Send + Sync + 'static,
    {
        PathVariable(self.0.and_then(move |u| f(u).map_err(Into::into)))
    }
}

impl PathVariable<String> {
    pub fn parse<V>(self) -> PathVariable<V>
    where
        V: FromStr + 'static,
        V::Err: Into<BoxError>,
    {
        self.convert(|s: String| s.parse::<V>())
    }

    pub fn enumerated<E: DeserializeOwned + 'static>(self) -> PathVariable<E> {
        PathVariable(self.0.and_then(|s: String| convert::variant::<E>(&s)))
    }
}

impl<T: 'static> PathVariable<String, T> {
    pub fn to_upper_case(self) -> Self {
        Self(self.0.to_upper_case())
    }

    pub fn to_lower_case(self) -> Self {
        Self(self.0.to_lower_case())
    }
}

impl<U: 'static, T: 'static> PathVariable<U, T> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn optional(self) -> PathVariable<U, Option<T>> {
        PathVariable(self.0.optional())
    }

    pub fn optional_or(self, default: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self(self.0.optional_or(default))
    }

    /// Same as [`optional`](Self::optional).
    pub fn nullable(self) -> PathVariable<U, Option<T>> {
        self.optional()
    }
}

impl<U: 'static, T: 'static> Extractor for PathVariable<U, T> {
    type Output = T;

    fn extract(&self, req: &Request) -> Result<T> {
        let name = self.name();
        self.0.extract(req.path_values(name)).map_err(|failure| match failure {
            Failure::Missing => missing("path variable", name),
            Failure::Invalid(cause) => {
                invalid("path variable", name, format!("Failed to parse path variable {name}."), cause)
            }
        })
    }
}
