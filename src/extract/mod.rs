//! Typed extractors for path variables, query parameters, headers and cookies.
//!
//! A descriptor names a value in the request and says how to convert it:
//!
//! ```rust
//! use tsu_dsl::extract::{header, int_param, int_var, param};
//!
//! let id = int_var("id");                              // required i32
//! let page = int_param("page").optional_or(1);         // i32, 1 when absent
//! let tags = param("tag").repeated();                  // Vec<String>, every ?tag=
//! let sort = param("sort").to_upper_case().optional(); // Option<String>
//! let auth = header("authorization").single();         // first value only
//! ```
//!
//! Modifiers return new descriptors and never change the name. Tuples of
//! extractors are extractors too, so any number of values can be pulled out
//! with one continuation:
//!
//! ```rust,ignore
//! ctx.extract((int_var("id"), int_param("page").optional_or(1)), |(id, page)| ...)
//! ```
//!
//! Failures are `400 Bad Request` and name the value that was missing or did
//! not convert. Extraction stops at the first failure, in tuple order.

mod convert;
mod cookie;
mod header;
mod param;
mod path;
mod query;

use tracing::debug;

use crate::error::{BoxError, Error, Result};
use crate::request::Request;

pub use cookie::{CookieName, cookie};
pub use header::{HeaderName, header};
pub use path::{
    PathVariable, big_int_var, bool_var, double_var, enum_var, float_var, int_var, long_var,
    path_var,
};
pub use query::{
    QueryParameter, big_int_param, bool_param, csv_param, double_param, enum_param, float_param,
    int_param, long_param, param,
};

/// Pulls a typed value out of a request.
pub trait Extractor {
    type Output;

    fn extract(&self, req: &Request) -> Result<Self::Output>;
}

macro_rules! tuple_extractor {
    ($($ty:ident),+) => {
        impl<$($ty: Extractor),+> Extractor for ($($ty,)+) {
            type Output = ($($ty::Output,)+);

            #[allow(non_snake_case)]
            fn extract(&self, req: &Request) -> Result<Self::Output> {
                let ($($ty,)+) = self;
                Ok(($($ty.extract(req)?,)+))
            }
        }
    };
}

tuple_extractor!(A);
tuple_extractor!(A, B);
tuple_extractor!(A, B, C);
tuple_extractor!(A, B, C, D);
tuple_extractor!(A, B, C, D, E);
tuple_extractor!(A, B, C, D, E, F);
tuple_extractor!(A, B, C, D, E, F, G);
tuple_extractor!(A, B, C, D, E, F, G, H);

fn missing(kind: &'static str, name: &str) -> Error {
    debug!(kind, name, "required value missing");
    Error::bad_request(format!("Missing required {kind} {name}."))
}

fn invalid(kind: &'static str, name: &str, message: String, cause: BoxError) -> Error {
    debug!(kind, name, cause = %cause, "value failed to convert");
    Error::bad_request_with(message, cause)
}
