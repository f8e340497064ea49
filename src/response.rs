//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Completion operations build these for you. Reach for [`ResponseBuilder`]
//! directly only inside [`complete_builder`](crate::complete_builder) or
//! [`Chainable::flat_map`](crate::Chainable::flat_map).

use std::convert::Infallible;
use std::fmt;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::value::ValueStream;

/// The body type of every [`Response`]: buffered or streamed, boxed.
pub type ResponseBody = UnsyncBoxBody<Bytes, Error>;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    FormData,     // application/x-www-form-urlencoded
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    NdJson,       // application/x-ndjson
    OctetStream,  // application/octet-stream  (binary / file download)
    Pdf,          // application/pdf
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::FormData    => "application/x-www-form-urlencoded",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::NdJson      => "application/x-ndjson",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }

    fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use tsu_dsl::{ContentType, Response, StatusCode};
///
/// Response::empty(StatusCode::NO_CONTENT);
/// Response::text(StatusCode::OK, "hello");
/// Response::builder(StatusCode::OK).bytes(ContentType::Xml, "<ok/>");
/// ```
pub struct Response {
    inner: http::Response<ResponseBody>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.inner.status())
            .field("headers", self.inner.headers())
            .finish_non_exhaustive()
    }
}

impl Response {
    /// Response with no body.
    pub fn empty(status: StatusCode) -> Self {
        Self::builder(status).no_body()
    }

    /// `text/plain; charset=utf-8` body.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::builder(status).text(body)
    }

    /// `application/json` body serialized from `value`.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self> {
        Self::builder(status).json(value)
    }

    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Collects the whole body, waiting for a streamed body to finish.
    pub async fn into_bytes(self) -> Result<Bytes> {
        Ok(self.inner.into_body().collect().await?.to_bytes())
    }

    /// Hands the response over to the hosting runtime.
    pub fn into_inner(self) -> http::Response<ResponseBody> {
        self.inner
    }
}

impl From<http::Response<ResponseBody>> for Response {
    fn from(inner: http::Response<ResponseBody>) -> Self {
        Self { inner }
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Terminated by a typed body method, so
/// you always know what you're sending.
#[derive(Clone, Debug)]
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Appends a header. Repeating a name keeps every value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Response> {
        let body = serde_json::to_vec(value)?;
        Ok(self.bytes(ContentType::Json, body))
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.bytes(ContentType::Text, body)
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, etc.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        let body = Full::new(body.into()).map_err(unreachable_error).boxed_unsync();
        self.finish(Some(content_type), body)
    }

    /// Terminate with a body that is written chunk by chunk as `chunks` yields.
    pub fn stream<S>(self, content_type: ContentType, chunks: S) -> Response
    where
        S: futures::Stream<Item = Result<Bytes>> + Send + 'static,
    {
        let body = StreamBody::new(chunks.map_ok(Frame::data)).boxed_unsync();
        self.finish(Some(content_type), body)
    }

    /// Terminate with a JSON array streamed one element at a time.
    pub fn json_stream<T>(self, elements: ValueStream<T>) -> Response
    where
        T: Serialize + Send + 'static,
    {
        self.stream(ContentType::Json, json_array(elements))
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        let body = Empty::<Bytes>::new().map_err(unreachable_error).boxed_unsync();
        self.finish(None, body)
    }

    fn finish(self, content_type: Option<ContentType>, body: ResponseBody) -> Response {
        let mut inner = http::Response::new(body);
        *inner.status_mut() = self.status;
        if let Some(content_type) = content_type {
            inner.headers_mut().insert(CONTENT_TYPE, content_type.header_value());
        }
        inner.headers_mut().extend(self.headers);
        Response { inner }
    }
}

fn unreachable_error(never: Infallible) -> Error {
    match never {}
}

/// `[`, the elements separated by `,`, then `]`.
fn json_array<T>(elements: ValueStream<T>) -> impl futures::Stream<Item = Result<Bytes>> + Send
where
    T: Serialize + Send + 'static,
{
    let open = stream::once(async { Ok(Bytes::from_static(b"[")) });
    let close = stream::once(async { Ok(Bytes::from_static(b"]")) });
    let items = elements.enumerate().map(|(i, element)| -> Result<Bytes> {
        let element = element?;
        let mut buf = if i == 0 { Vec::new() } else { vec![b','] };
        serde_json::to_writer(&mut buf, &element)?;
        Ok(Bytes::from(buf))
    });
    open.chain(items).chain(close)
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

/// Global translation of a surfaced error.
///
/// Status errors keep their status and message. Anything else becomes a bare
/// `500` so internal detail never leaks.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self.public_message() {
            Some(message) => Response::text(status, message),
            None => Response::text(status, reason(status)),
        }
    }
}

pub(crate) fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_body_and_content_type() {
        let res = Response::json(StatusCode::OK, &123).unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(res.into_bytes().await.unwrap(), "123");
    }

    #[tokio::test]
    async fn test_builder_keeps_extra_headers() {
        let res = Response::builder(StatusCode::CREATED)
            .header(http::header::LOCATION, HeaderValue::from_static("/users/99"))
            .no_body();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[http::header::LOCATION], "/users/99");
        assert!(res.headers().get(CONTENT_TYPE).is_none());
        assert!(res.into_bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_stream_writes_an_array() {
        let elements = crate::value::stream_iter(vec![1, 2, 3]);
        let res = Response::builder(StatusCode::OK).json_stream(elements);
        assert_eq!(res.into_bytes().await.unwrap(), "[1,2,3]");
    }

    #[tokio::test]
    async fn test_json_stream_of_nothing_is_an_empty_array() {
        let elements = crate::value::stream_iter(Vec::<i32>::new());
        let res = Response::builder(StatusCode::OK).json_stream(elements);
        assert_eq!(res.into_bytes().await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_untyped_error_hides_detail() {
        let res = Error::from_boxed("database password is hunter2".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.into_bytes().await.unwrap(), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_status_error_shows_message() {
        let res = Error::bad_request("Missing required header x-api-key.").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.into_bytes().await.unwrap(), "Missing required header x-api-key.");
    }

    #[tokio::test]
    async fn test_response_converts_to_itself() {
        let res = Response::text(StatusCode::ACCEPTED, "queued").into_response();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.into_bytes().await.unwrap(), "queued");
    }
}
