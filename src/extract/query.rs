//! Query parameter descriptors.

use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::{BoxError, Result};
use crate::extract::convert::{self, Converter};
use crate::extract::param::{Failure, Param};
use crate::extract::{Extractor, invalid, missing};
use crate::request::Request;

/// A named query parameter converted to `U`, extracted as `T`.
///
/// Fresh descriptors are required and single-valued: the first occurrence is
/// converted and a parameter absent from the query string is a `400`.
pub struct QueryParameter<U, T = U>(Param<U, T>);

impl<U, T> Clone for QueryParameter<U, T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

fn typed<U: 'static>(name: &str, converter: Converter<U>) -> QueryParameter<U> {
    QueryParameter(Param::new(name, converter))
}

/// The raw string value.
pub fn param(name: &str) -> QueryParameter<String> {
    typed(name, convert::string())
}

pub fn int_param(name: &str) -> QueryParameter<i32> {
    typed(name, convert::from_str())
}

pub fn long_param(name: &str) -> QueryParameter<i64> {
    typed(name, convert::from_str())
}

pub fn float_param(name: &str) -> QueryParameter<f32> {
    typed(name, convert::from_str())
}

pub fn double_param(name: &str) -> QueryParameter<f64> {
    typed(name, convert::from_str())
}

pub fn bool_param(name: &str) -> QueryParameter<bool> {
    typed(name, convert::from_str())
}

pub fn big_int_param(name: &str) -> QueryParameter<i128> {
    typed(name, convert::from_str())
}

/// A unit enum variant, matched by its exact serde name.
pub fn enum_param<E: DeserializeOwned + 'static>(name: &str) -> QueryParameter<E> {
    param(name).enumerated()
}

/// `?ids=a,b,c` as `["a", "b", "c"]`. Commas cannot be escaped.
pub fn csv_param(name: &str) -> QueryParameter<String, Vec<String>> {
    param(name).csv()
}

impl<U: 'static> QueryParameter<U> {
    /// Converts the value further with `f`.
    pub fn convert<V, E, F>(self, f: F) -> QueryParameter<V>
    where
        V: 'static,
        E: Into<BoxError>,
        F: Fn(U) -> std::result::Result<V, E> + Send + Sync + 'static,
    {
        QueryParameter(self.0.and_then(move |u| f(u).map_err(Into::into)))
    }

    /// Every occurrence, each converted on its own, in request order.
    pub fn repeated(self) -> QueryParameter<U, Vec<U>> {
        QueryParameter(self.0.repeated())
    }

    /// The first occurrence split on `,`, each token converted on its own.
    pub fn csv(self) -> QueryParameter<U, Vec<U>> {
        QueryParameter(self.0.csv())
    }
}

impl<U: 'static> QueryParameter<U, Vec<U>> {
    /// Narrows back to the first element. Later elements are not converted.
    pub fn single(self) -> QueryParameter<U> {
        QueryParameter(self.0.single())
    }
}

impl QueryParameter<String> {
    pub fn parse<V>(self) -> QueryParameter<V>
    where
        V: FromStr + 'static,
        V::Err: Into<BoxError>,
    {
        self.convert(|s: String| s.parse::<V>())
    }

    pub fn enumerated<E: DeserializeOwned + 'static>(self) -> QueryParameter<E> {
        QueryParameter(self.0.and_then(|s: String| convert::variant::<E>(&s)))
    }
}

impl<T: 'static> QueryParameter<String, T> {
    pub fn to_upper_case(self) -> Self {
        Self(self.0.to_upper_case())
    }

    pub fn to_lower_case(self) -> Self {
        Self(self.0.to_lower_case())
    }
}

impl<U: 'static, T: 'static> QueryParameter<U, T> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// `None` when the parameter is absent. A value that does not convert is
    /// still a `400`.
    pub fn optional(self) -> QueryParameter<U, Option<T>> {
        QueryParameter(self.0.optional())
    }

    /// `default` when the parameter is absent.
    pub fn optional_or(self, default: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self(self.0.optional_or(default))
    }

    /// Same as [`optional`](Self::optional).
    pub fn nullable(self) -> QueryParameter<U, Option<T>> {
        self.optional()
    }
}

impl<U: 'static, T: 'static> Extractor for QueryParameter<U, T> {
    type Output = T;

    fn extract(&self, req: &Request) -> Result<T> {
        let name = self.name();
        self.0.extract(req.query_parameters(name)).map_err(|failure| match failure {
            Failure::Missing => missing("query parameter", name),
            Failure::Invalid(cause) => invalid(
                "query parameter",
                name,
                format!("Invalid value for query parameter {name}. Conversion failed."),
                cause,
            ),
        })
    }
}
