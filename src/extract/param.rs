//! The descriptor core shared by every request source.
//!
//! Sources are normalized to `Option<&[String]>` before they reach a
//! descriptor: `None` means the value is not in the request at all.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::BoxError;
use crate::extract::convert::{self, Converter};

/// Why a descriptor could not produce its value.
#[derive(Debug)]
pub(crate) enum Failure {
    Missing,
    Invalid(BoxError),
}

type ValueFn<U, T> =
    Arc<dyn Fn(Option<&[String]>, &Converter<U>) -> Result<T, Failure> + Send + Sync>;

/// A named converter plus the function that turns raw values into a `T`.
///
/// Modifiers never touch `name`; they return a new `Param` with a different
/// value function or converter. Raw values are split (`csv`) and case
/// normalized before the value function sees them, wherever those modifiers
/// sit in the chain.
pub(crate) struct Param<U, T> {
    name: Arc<str>,
    split: bool,
    normalize: Option<fn(&str) -> String>,
    converter: Converter<U>,
    values: ValueFn<U, T>,
}

impl<U, T> Clone for Param<U, T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            split: self.split,
            normalize: self.normalize,
            converter: Arc::clone(&self.converter),
            values: Arc::clone(&self.values),
        }
    }
}

impl<U: 'static> Param<U, U> {
    /// Required, single-valued: converts the first raw value.
    pub(crate) fn new(name: &str, converter: Converter<U>) -> Self {
        let values: ValueFn<U, U> = Arc::new(|raw: Option<&[String]>, convert: &Converter<U>| {
            match raw.and_then(<[String]>::first) {
                Some(first) => convert(first).map_err(Failure::Invalid),
                None => Err(Failure::Missing),
            }
        });
        Self { name: Arc::from(name), split: false, normalize: None, converter, values }
    }

    /// Converts the value further, keeping whatever shape (default, first of
    /// a list) was already applied. A default goes through `f` as well.
    pub(crate) fn and_then<V, F>(self, f: F) -> Param<V, V>
    where
        V: 'static,
        F: Fn(U) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let next = Arc::clone(&f);
        let first = Arc::clone(&self.converter);
        let shaped = self.values;
        let values: ValueFn<V, V> = Arc::new(move |raw: Option<&[String]>, _: &Converter<V>| {
            shaped(raw, &first).and_then(|u| next(u).map_err(Failure::Invalid))
        });
        Param {
            name: self.name,
            split: self.split,
            normalize: self.normalize,
            converter: convert::and_then(self.converter, move |u| f(u)),
            values,
        }
    }

    /// Every raw value, each converted on its own, in request order.
    pub(crate) fn repeated(self) -> Param<U, Vec<U>> {
        self.with_values(|raw, convert| {
            let raw = raw.ok_or(Failure::Missing)?;
            raw.iter()
                .map(|value| convert(value).map_err(Failure::Invalid))
                .collect()
        })
    }

    /// The first raw value split on `,`, each token converted on its own.
    pub(crate) fn csv(self) -> Param<U, Vec<U>> {
        Param { split: true, ..self.repeated() }
    }
}

impl<U: 'static> Param<U, Vec<U>> {
    /// Narrows to the first element. Later elements are never converted, so
    /// they cannot fail the extraction. No element at all counts as missing.
    pub(crate) fn single(self) -> Param<U, U> {
        let values = Arc::clone(&self.values);
        self.with_values(move |raw, convert| {
            let first = raw.map(|raw| &raw[..raw.len().min(1)]);
            values(first, convert)?.into_iter().next().ok_or(Failure::Missing)
        })
    }
}

/// Case modifiers rewrite the raw strings, so they hold before and after any
/// conversion. The last one applied wins.
impl<T: 'static> Param<String, T> {
    pub(crate) fn to_upper_case(self) -> Self {
        Self { normalize: Some(str::to_uppercase), ..self }
    }

    pub(crate) fn to_lower_case(self) -> Self {
        Self { normalize: Some(str::to_lowercase), ..self }
    }
}

impl<U: 'static, T: 'static> Param<U, T> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn extract(&self, raw: Option<&[String]>) -> Result<T, Failure> {
        let prepared = raw.map(|raw| self.prepare(raw));
        (self.values)(prepared.as_deref(), &self.converter)
    }

    fn prepare<'a>(&self, raw: &'a [String]) -> Cow<'a, [String]> {
        let raw: Cow<'a, [String]> = match (self.split, raw.first()) {
            (true, Some(first)) => Cow::Owned(first.split(',').map(str::to_owned).collect()),
            _ => Cow::Borrowed(raw),
        };
        match self.normalize {
            Some(normalize) => Cow::Owned(raw.iter().map(|value| normalize(value)).collect()),
            None => raw,
        }
    }

    /// Absence becomes `None`. A present value that fails to convert still fails.
    pub(crate) fn optional(self) -> Param<U, Option<T>> {
        let values = Arc::clone(&self.values);
        self.with_values(move |raw, convert| match values(raw, convert) {
            Ok(value) => Ok(Some(value)),
            Err(Failure::Missing) => Ok(None),
            Err(err) => Err(err),
        })
    }

    /// Absence becomes `default`. A present value that fails to convert still fails.
    pub(crate) fn optional_or(self, default: T) -> Param<U, T>
    where
        T: Clone + Send + Sync,
    {
        let values = Arc::clone(&self.values);
        self.with_values(move |raw, convert| match values(raw, convert) {
            Err(Failure::Missing) => Ok(default.clone()),
            other => other,
        })
    }

    fn with_values<V, F>(self, values: F) -> Param<U, V>
    where
        F: Fn(Option<&[String]>, &Converter<U>) -> Result<V, Failure> + Send + Sync + 'static,
    {
        Param {
            name: self.name,
            split: self.split,
            normalize: self.normalize,
            converter: self.converter,
            values: Arc::new(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn int(name: &str) -> Param<i32, i32> {
        Param::new(name, convert::from_str())
    }

    #[test]
    fn test_required_takes_first_value() {
        let v = raw(&["5", "6"]);
        assert_eq!(int("v").extract(Some(&v[..])).unwrap(), 5);
        assert!(matches!(int("v").extract(None), Err(Failure::Missing)));
    }

    #[test]
    fn test_conversion_failure_is_invalid() {
        let v = raw(&["abc"]);
        assert!(matches!(int("v").extract(Some(&v[..])), Err(Failure::Invalid(_))));
    }

    #[test]
    fn test_optional_only_covers_absence() {
        let p = int("v").optional();
        assert_eq!(p.extract(None).unwrap(), None);
        assert_eq!(p.extract(Some(&raw(&["7"])[..])).unwrap(), Some(7));
        assert!(matches!(p.extract(Some(&raw(&["x"])[..])), Err(Failure::Invalid(_))));
    }

    #[test]
    fn test_optional_twice_is_well_defined() {
        let p = int("v").optional().optional();
        assert_eq!(p.extract(None).unwrap(), Some(None));
        assert_eq!(p.extract(Some(&raw(&["1"])[..])).unwrap(), Some(Some(1)));
    }

    #[test]
    fn test_optional_or_substitutes_default() {
        let p = int("v").optional_or(10);
        assert_eq!(p.extract(None).unwrap(), 10);
        assert_eq!(p.extract(Some(&raw(&["3"])[..])).unwrap(), 3);
    }

    #[test]
    fn test_repeated_converts_every_value_in_order() {
        let p = int("v").repeated();
        assert_eq!(p.extract(Some(&raw(&["3", "1", "2"])[..])).unwrap(), [3, 1, 2]);
        assert!(matches!(p.extract(None), Err(Failure::Missing)));
        assert!(matches!(p.extract(Some(&raw(&["1", "x"])[..])), Err(Failure::Invalid(_))));
    }

    #[test]
    fn test_csv_splits_first_value() {
        let p = int("ids").csv();
        assert_eq!(p.extract(Some(&raw(&["1,2,3"])[..])).unwrap(), [1, 2, 3]);
        assert!(matches!(p.extract(Some(&raw(&["1,,3"])[..])), Err(Failure::Invalid(_))));
    }

    #[test]
    fn test_single_narrows_and_empty_is_missing() {
        let p = int("v").repeated().single();
        assert_eq!(p.extract(Some(&raw(&["4", "5"])[..])).unwrap(), 4);
        assert!(matches!(p.extract(Some(&[])), Err(Failure::Missing)));
    }

    #[test]
    fn test_modifiers_keep_the_name() {
        let p = int("page").repeated().single().optional_or(1);
        assert_eq!(p.name(), "page");
        let s = Param::new("mode", convert::string()).to_upper_case().and_then(|s| Ok(s.len()));
        assert_eq!(s.name(), "mode");
    }

    #[test]
    fn test_conversion_keeps_shape() {
        let doubled = int("v").optional_or(4).and_then(|n| Ok(n * 2));
        assert_eq!(doubled.extract(None).unwrap(), 8);
        assert_eq!(doubled.extract(Some(&raw(&["5"])[..])).unwrap(), 10);
        let first = int("ids").csv().single().and_then(|n| Ok(n + 1));
        assert_eq!(first.extract(Some(&raw(&["1,2"])[..])).unwrap(), 2);
        let all = int("ids").and_then(|n| Ok(n + 1)).repeated();
        assert_eq!(all.extract(Some(&raw(&["1", "2"])[..])).unwrap(), [2, 3]);
    }

    #[test]
    fn test_case_modifiers_apply_wherever_they_sit() {
        let p = Param::new("mode", convert::string()).to_lower_case();
        assert_eq!(p.extract(Some(&raw(&["FaSt"])[..])).unwrap(), "fast");
        let q = Param::new("mode", convert::string()).repeated().to_upper_case();
        assert_eq!(q.extract(Some(&raw(&["a", "b"])[..])).unwrap(), ["A", "B"]);

        let trimmed = Param::new("mode", convert::string())
            .and_then(|s| Ok(s.trim().to_owned()))
            .to_upper_case();
        assert_eq!(trimmed.extract(Some(&raw(&[" fast "])[..])).unwrap(), "FAST");
        let optional = trimmed.optional().to_lower_case();
        assert_eq!(optional.extract(Some(&raw(&["FAST"])[..])).unwrap().as_deref(), Some("fast"));
    }

    #[test]
    fn test_single_ignores_later_elements() {
        let bad = raw(&["1", "x"]);
        assert_eq!(int("id").repeated().single().extract(Some(&bad[..])).unwrap(), 1);
        let tokens = raw(&["1,x"]);
        assert_eq!(int("id").csv().single().extract(Some(&tokens[..])).unwrap(), 1);
        assert!(matches!(int("id").csv().extract(Some(&tokens[..])), Err(Failure::Invalid(_))));
    }
}
