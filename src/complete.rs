//! The `complete*` family: every way a handler can finish.
//!
//! | Function                | Produces    | Falls back on empty |
//! |-------------------------|-------------|---------------------|
//! | [`complete`]            | Terminating | -                   |
//! | [`complete_with`]       | Terminating | -                   |
//! | [`complete_stream`]     | Terminating | -                   |
//! | [`complete_body`]       | Terminating | -                   |
//! | [`complete_builder`]    | Terminating | -                   |
//! | [`complete_value`]      | Chainable   | yes                 |
//! | [`complete_async`]      | Chainable   | yes                 |
//! | [`complete_later`]      | Nested      | whatever it yields  |
//! | [`fail_with`]           | Terminating | -                   |

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

use crate::error::{BoxError, Error, Result};
use crate::operation::{Chainable, CompleteOperation};
use crate::response::{ContentType, Response, ResponseBuilder};
use crate::value::{self, AsyncValue, ValueStream};

/// Responds with `status` and no body.
pub fn complete(status: StatusCode) -> CompleteOperation {
    CompleteOperation::respond(Response::empty(status))
}

/// Responds with `status` and `value` serialized as JSON.
///
/// Serialization happens when the response is resolved; a failure surfaces
/// as [`Error::Json`].
pub fn complete_with<T>(status: StatusCode, value: T) -> CompleteOperation
where
    T: Serialize + Send + 'static,
{
    CompleteOperation::terminating(async move { Response::json(status, &value) })
}

/// Responds with `status` and a JSON array written element by element.
pub fn complete_stream<T>(status: StatusCode, elements: ValueStream<T>) -> CompleteOperation
where
    T: Serialize + Send + 'static,
{
    CompleteOperation::terminating(async move { Ok(Response::builder(status).json_stream(elements)) })
}

/// Responds with `status` and a raw body of the given content type.
pub fn complete_body(status: StatusCode, content_type: ContentType, body: impl Into<Bytes>) -> CompleteOperation {
    CompleteOperation::respond(Response::builder(status).bytes(content_type, body))
}

/// Responds with whatever `f` builds from a builder seeded with `status`.
pub fn complete_builder<F>(status: StatusCode, f: F) -> CompleteOperation
where
    F: FnOnce(ResponseBuilder) -> Result<Response> + Send + 'static,
{
    CompleteOperation::terminating(async move { f(Response::builder(status)) })
}

/// Responds with `value` if there is one; otherwise defers to the next `or`
/// operand, or answers `status` with no body.
pub fn complete_value<T>(status: StatusCode, value: Option<T>) -> Chainable<T>
where
    T: Send + 'static,
{
    Chainable::new(Response::builder(status), value::from_option(value))
}

/// Like [`complete_value`], for a value that is not there yet.
pub fn complete_async<T>(status: StatusCode, value: AsyncValue<T>) -> Chainable<T>
where
    T: Send + 'static,
{
    Chainable::new(Response::builder(status), value)
}

/// Continues with the operation `fut` eventually yields.
pub fn complete_later<F, R>(fut: F) -> CompleteOperation
where
    F: Future<Output = Result<R>> + Send + 'static,
    R: Into<CompleteOperation>,
{
    CompleteOperation::nested(async move { Ok(fut.await?.into()) })
}

/// Surfaces `err` as the handler's outcome.
///
/// An [`Error`] keeps its status. Anything else translates to `500`.
pub fn fail_with(err: impl Into<BoxError>) -> CompleteOperation {
    CompleteOperation::fail(Error::from_boxed(err.into()))
}

/// Surfaces a `500 Internal Server Error` carrying `message`.
pub fn fail_with_message(message: impl Into<String>) -> CompleteOperation {
    CompleteOperation::fail(Error::internal(message))
}

// ── Shortcuts ─────────────────────────────────────────────────────────────────

/// `200 OK` with `value` as JSON.
pub fn ok<T: Serialize + Send + 'static>(value: T) -> CompleteOperation {
    complete_with(StatusCode::OK, value)
}

/// `200 OK` with `value` as JSON if present; chainable.
pub fn ok_value<T: Send + 'static>(value: Option<T>) -> Chainable<T> {
    complete_value(StatusCode::OK, value)
}

/// `201 Created` with `value` as JSON.
pub fn created<T: Serialize + Send + 'static>(value: T) -> CompleteOperation {
    complete_with(StatusCode::CREATED, value)
}

pub fn no_content() -> CompleteOperation {
    complete(StatusCode::NO_CONTENT)
}

pub fn not_found() -> CompleteOperation {
    complete(StatusCode::NOT_FOUND)
}

/// `400 Bad Request` with `message` as plain text.
pub fn bad_request(message: impl Into<String>) -> CompleteOperation {
    CompleteOperation::respond(Response::text(StatusCode::BAD_REQUEST, message))
}
