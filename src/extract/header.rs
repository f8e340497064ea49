//! Header descriptors.

use crate::error::Result;
use crate::extract::convert;
use crate::extract::param::{Failure, Param};
use crate::extract::{Extractor, invalid, missing};
use crate::request::Request;

/// A named header, extracted as `T`.
///
/// Fresh descriptors yield every value of the header and are required: a
/// request without the header is a `400`. Use [`single`](Self::single) for
/// just the first value.
pub struct HeaderName<T = Vec<String>>(Param<String, T>);

impl<T> Clone for HeaderName<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Every value of the header. Accepts `http::header` constants.
pub fn header(name: impl AsRef<str>) -> HeaderName {
    HeaderName(Param::new(name.as_ref(), convert::string()).repeated())
}

impl HeaderName {
    pub fn single(self) -> HeaderName<String> {
        HeaderName(self.0.single())
    }
}

impl<T: 'static> HeaderName<T> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn optional(self) -> HeaderName<Option<T>> {
        HeaderName(self.0.optional())
    }

    pub fn optional_or(self, default: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self(self.0.optional_or(default))
    }

    /// Same as [`optional`](Self::optional).
    pub fn nullable(self) -> HeaderName<Option<T>> {
        self.optional()
    }

    pub fn to_upper_case(self) -> Self {
        Self(self.0.to_upper_case())
    }

    pub fn to_lower_case(self) -> Self {
        Self(self.0.to_lower_case())
    }
}

impl<T: 'static> Extractor for HeaderName<T> {
    type Output = T;

    fn extract(&self, req: &Request) -> Result<T> {
        let name = self.name();
        let values = req.header_values(name);
        let raw = if values.is_empty() { None } else { Some(values.as_slice()) };
        self.0.extract(raw).map_err(|failure| match failure {
            Failure::Missing => missing("header", name),
            Failure::Invalid(cause) => {
                invalid("header", name, format!("Invalid value for header {name}."), cause)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        Request::new(builder.body(Bytes::new()).unwrap())
    }

    #[test]
    fn test_all_values_by_default() {
        let req = request(&[("accept", "text/html"), ("accept", "application/json")]);
        assert_eq!(header("accept").extract(&req).unwrap(), ["text/html", "application/json"]);
        assert_eq!(header("accept").single().extract(&req).unwrap(), "text/html");
    }

    #[test]
    fn test_missing_header() {
        let err = header(http::header::AUTHORIZATION).single().extract(&request(&[])).unwrap_err();
        assert_eq!(err.to_string(), "400 Bad Request: Missing required header authorization.");
    }

    #[test]
    fn test_optional_header() {
        let req = request(&[("x-trace", "abc")]);
        assert_eq!(header("x-trace").single().optional().extract(&req).unwrap().as_deref(), Some("abc"));
        assert_eq!(header("x-span").single().optional().extract(&req).unwrap(), None);
        assert_eq!(header("x-span").single().optional_or("none".into()).extract(&req).unwrap(), "none");
        assert_eq!(header("x-span").nullable().extract(&req).unwrap(), None);
    }

    #[test]
    fn test_case_normalization() {
        let req = request(&[("x-mode", "Fast")]);
        assert_eq!(header("x-mode").single().to_lower_case().extract(&req).unwrap(), "fast");
        assert_eq!(header("X-Mode").to_upper_case().extract(&req).unwrap(), ["FAST"]);
    }
}
