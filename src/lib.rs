//! # tsu-dsl
//!
//! A declarative, typed handler DSL for hyper-based services. Say what you
//! need from the request, say how to answer. Nothing more.
//!
//! ## The contract
//!
//! Your router owns routing. Your server owns sockets, TLS and limits.
//! tsu-dsl owns the part that changes between handlers:
//!
//! - **Extraction**: typed, named descriptors for path variables, query
//!   parameters, headers and cookies. A missing or malformed value is a `400`
//!   naming it, without a line of validation code.
//! - **Completion**: a small algebra of operations that produce the response.
//!   `a.or(b)` answers with `b` when `a` turns out to have nothing.
//! - **Async bridging**: any future, with an optional timeout, continues the
//!   handler when it completes.
//!
//! ## Quick start
//!
//! ```rust
//! use tsu_dsl::extract::{int_param, int_var};
//! use tsu_dsl::{HandlerService, StatusCode, complete_value, handler, not_found};
//!
//! fn find(id: i32, rev: i32) -> Option<String> {
//!     (id == 1).then(|| format!("doc 1 rev {rev}"))
//! }
//!
//! let get_doc = handler(|ctx| {
//!     ctx.extract((int_var("id"), int_param("rev").optional_or(0)), |(id, rev)| {
//!         complete_value(StatusCode::OK, find(id, rev)).or(not_found())
//!     })
//! });
//!
//! // Mount it on a route of your hyper host; it implements `hyper::service::Service`.
//! let svc = HandlerService::new(get_doc);
//! ```
//!
//! | Request                 | Response                          |
//! |-------------------------|-----------------------------------|
//! | `GET /docs/1?rev=3`     | `200 "doc 1 rev 3"`               |
//! | `GET /docs/2`           | `404`                             |
//! | `GET /docs/x`           | `400 Failed to parse path variable id.` |
//! | `GET /docs/1?rev=new`   | `400 Invalid value for query parameter rev. Conversion failed.` |

mod complete;
mod context;
mod error;
mod handler;
mod operation;
mod request;
mod response;
mod service;

pub mod extract;
pub mod future;
pub mod value;

pub use complete::{
    bad_request, complete, complete_async, complete_body, complete_builder, complete_later,
    complete_stream, complete_value, complete_with, created, fail_with, fail_with_message,
    no_content, not_found, ok, ok_value,
};
pub use context::HandlerContext;
pub use error::{BoxError, Error, Result};
pub use future::{TimeUnit, Timeout, on_complete, on_success};
pub use handler::{Handler, HandlerFuture, handler};
pub use operation::{Chainable, CompleteOperation};
pub use request::{PathParams, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBody, ResponseBuilder};
pub use service::HandlerService;
pub use value::{AsyncValue, ValueStream};

/// Standard header names, for use with [`extract::header`].
pub use http::header;
pub use http::{Method, StatusCode};
