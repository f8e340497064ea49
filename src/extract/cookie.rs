//! Cookie descriptors.

use crate::error::Result;
use crate::extract::convert;
use crate::extract::param::{Failure, Param};
use crate::extract::{Extractor, invalid, missing};
use crate::request::Request;

/// A named cookie, extracted as `T`.
///
/// Fresh descriptors yield every value sent under the name and are required.
pub struct CookieName<T = Vec<String>>(Param<String, T>);

impl<T> Clone for CookieName<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

pub fn cookie(name: &str) -> CookieName {
    CookieName(Param::new(name, convert::string()).repeated())
}

impl CookieName {
    pub fn single(self) -> CookieName<String> {
        CookieName(self.0.single())
    }
}

impl<T: 'static> CookieName<T> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn optional(self) -> CookieName<Option<T>> {
        CookieName(self.0.optional())
    }

    pub fn optional_or(self, default: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self(self.0.optional_or(default))
    }

    /// Same as [`optional`](Self::optional).
    pub fn nullable(self) -> CookieName<Option<T>> {
        self.optional()
    }

    pub fn to_upper_case(self) -> Self {
        Self(self.0.to_upper_case())
    }

    pub fn to_lower_case(self) -> Self {
        Self(self.0.to_lower_case())
    }
}

impl<T: 'static> Extractor for CookieName<T> {
    type Output = T;

    fn extract(&self, req: &Request) -> Result<T> {
        let name = self.name();
        self.0.extract(req.cookie_values(name)).map_err(|failure| match failure {
            Failure::Missing => missing("cookie", name),
            Failure::Invalid(cause) => {
                invalid("cookie", name, format!("Invalid value for cookie {name}."), cause)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request(cookies: &str) -> Request {
        Request::new(http::Request::builder().header("cookie", cookies).body(Bytes::new()).unwrap())
    }

    #[test]
    fn test_cookie_values() {
        let req = request("session=abc; lang=en");
        assert_eq!(cookie("session").single().extract(&req).unwrap(), "abc");
        assert_eq!(cookie("lang").extract(&req).unwrap(), ["en"]);
    }

    #[test]
    fn test_missing_cookie() {
        let err = cookie("session").single().extract(&request("lang=en")).unwrap_err();
        assert_eq!(err.to_string(), "400 Bad Request: Missing required cookie session.");
        assert_eq!(cookie("session").single().optional().extract(&request("lang=en")).unwrap(), None);
    }

    #[test]
    fn test_default_and_case() {
        let req = request("theme=Dark");
        assert_eq!(cookie("theme").single().to_lower_case().extract(&req).unwrap(), "dark");
        assert_eq!(cookie("lang").single().optional_or("en".into()).extract(&req).unwrap(), "en");
    }
}
