//! String-to-value converters.

use std::str::FromStr;
use std::sync::Arc;

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};

use crate::error::BoxError;

/// Converts one raw request value into a `U`.
pub(crate) type Converter<U> = Arc<dyn Fn(&str) -> Result<U, BoxError> + Send + Sync>;

/// Keeps the raw string.
pub(crate) fn string() -> Converter<String> {
    Arc::new(|raw| Ok(raw.to_owned()))
}

/// Parses with the type's own [`FromStr`].
pub(crate) fn from_str<U>() -> Converter<U>
where
    U: FromStr + 'static,
    U::Err: Into<BoxError>,
{
    Arc::new(|raw| raw.parse::<U>().map_err(Into::into))
}

/// Matches a unit variant by its exact, case-sensitive serde name.
pub(crate) fn variant<E: DeserializeOwned>(raw: &str) -> Result<E, BoxError> {
    let de: StrDeserializer<'_, ValueError> = raw.into_deserializer();
    E::deserialize(de).map_err(Into::into)
}

/// Runs `next` on whatever `first` produced.
pub(crate) fn and_then<U, V, F>(first: Converter<U>, next: F) -> Converter<V>
where
    U: 'static,
    F: Fn(U) -> Result<V, BoxError> + Send + Sync + 'static,
{
    Arc::new(move |raw| first(raw).and_then(&next))
}
