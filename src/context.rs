//! Per-request scope the DSL block runs in.
//!
//! ```rust,ignore
//! handler(|ctx| {
//!     ctx.extract((int_var("id"), int_param("page").optional_or(1)), |(id, page)| {
//!         complete_async(StatusCode::OK, store.page(id, page)).or(not_found())
//!     })
//! })
//! ```
//!
//! Extraction from path, query, headers and cookies is synchronous: the
//! continuation runs right away, borrowing whatever it likes. Only body reads
//! and the future bridges in [`future`](crate::future) run their continuation
//! later, so those continuations must be `'static`; clone the context (an
//! `Arc` bump) to use it in there.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream;
use futures::{FutureExt, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::extract::{CookieName, Extractor, HeaderName, PathVariable, QueryParameter};
use crate::operation::CompleteOperation;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::value::{AsyncValue, ValueStream, stream_iter};

/// The request being handled, plus everything the DSL can do with it.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    request: Arc<Request>,
}

impl HandlerContext {
    pub fn new(request: Request) -> Self {
        Self { request: Arc::new(request) }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Hands the request to `f`.
    pub fn extract_request<R, F>(&self, f: F) -> CompleteOperation
    where
        R: Into<CompleteOperation>,
        F: FnOnce(&Request) -> R,
    {
        f(&self.request).into()
    }

    /// Evaluates a nested block against the same request and returns its
    /// response directly, without finishing the outer handler.
    ///
    /// Use it to post-process what a sub-handler would have answered.
    pub fn execute<R, F>(&self, block: F) -> BoxFuture<'static, Result<Response>>
    where
        R: Into<CompleteOperation>,
        F: FnOnce(&HandlerContext) -> R,
    {
        block(self).into().response()
    }

    /// Runs `f` with the extracted value, or answers `400` naming what failed.
    pub fn extract<E, R, F>(&self, extractor: E, f: F) -> CompleteOperation
    where
        E: Extractor,
        R: Into<CompleteOperation>,
        F: FnOnce(E::Output) -> R,
    {
        match extractor.extract(&self.request) {
            Ok(value) => f(value).into(),
            Err(err) => CompleteOperation::respond(err.into_response()),
        }
    }

    pub fn path_variable<U, T, R, F>(&self, var: PathVariable<U, T>, f: F) -> CompleteOperation
    where
        U: 'static,
        T: 'static,
        R: Into<CompleteOperation>,
        F: FnOnce(T) -> R,
    {
        self.extract(var, f)
    }

    /// Several path variables at once, as a tuple.
    pub fn path_variables<E, R, F>(&self, vars: E, f: F) -> CompleteOperation
    where
        E: Extractor,
        R: Into<CompleteOperation>,
        F: FnOnce(E::Output) -> R,
    {
        self.extract(vars, f)
    }

    /// Several query parameters (or any mix of extractors) at once, as a tuple.
    pub fn parameters<E, R, F>(&self, params: E, f: F) -> CompleteOperation
    where
        E: Extractor,
        R: Into<CompleteOperation>,
        F: FnOnce(E::Output) -> R,
    {
        self.extract(params, f)
    }

    pub fn query_parameter<U, T, R, F>(&self, param: QueryParameter<U, T>, f: F) -> CompleteOperation
    where
        U: 'static,
        T: 'static,
        R: Into<CompleteOperation>,
        F: FnOnce(T) -> R,
    {
        self.extract(param, f)
    }

    pub fn header<T, R, F>(&self, header: HeaderName<T>, f: F) -> CompleteOperation
    where
        T: 'static,
        R: Into<CompleteOperation>,
        F: FnOnce(T) -> R,
    {
        self.extract(header, f)
    }

    pub fn cookie<T, R, F>(&self, cookie: CookieName<T>, f: F) -> CompleteOperation
    where
        T: 'static,
        R: Into<CompleteOperation>,
        F: FnOnce(T) -> R,
    {
        self.extract(cookie, f)
    }

    /// The JSON request body. An empty body is an empty value; a malformed
    /// one fails with `400`.
    pub fn body<T>(&self) -> AsyncValue<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let bytes = self.request.body().clone();
        async move {
            if bytes.is_empty() {
                return Ok(None);
            }
            serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| Error::bad_request_with("Failed to read request body.", e))
        }
        .boxed()
    }

    /// Runs `f` with the JSON request body, which must be present.
    pub fn with_body<T, R, F>(&self, f: F) -> CompleteOperation
    where
        T: DeserializeOwned + Send + 'static,
        R: Into<CompleteOperation>,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let body = self.body::<T>();
        CompleteOperation::nested(async move {
            Ok(match body.await {
                Ok(Some(value)) => f(value).into(),
                Ok(None) => CompleteOperation::respond(
                    Error::bad_request("Missing required request body.").into_response(),
                ),
                Err(err) => CompleteOperation::respond(err.into_response()),
            })
        })
    }

    /// A JSON array body as a stream of its elements. An empty body is an
    /// empty stream.
    pub fn body_stream<T>(&self) -> ValueStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let bytes = self.request.body();
        if bytes.is_empty() {
            return stream_iter(Vec::new());
        }
        match serde_json::from_slice::<Vec<T>>(bytes) {
            Ok(elements) => stream_iter(elements),
            Err(e) => {
                let err = Error::bad_request_with("Failed to read request body.", e);
                stream::once(async move { Err(err) }).boxed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::TryStreamExt;
    use http::StatusCode;
    use serde::Deserialize;

    use super::*;
    use crate::complete::{complete_async, complete_with, not_found, ok};
    use crate::extract::{int_param, int_var};
    use crate::request::PathParams;

    #[derive(Debug, Deserialize, PartialEq)]
    struct NewUser {
        name: String,
    }

    fn context(uri: &str, body: &'static str) -> HandlerContext {
        HandlerContext::new(Request::new(
            http::Request::builder()
                .uri(uri)
                .extension(PathParams::from_iter([("id", "123")]))
                .body(Bytes::from_static(body.as_bytes()))
                .unwrap(),
        ))
    }

    async fn resolve(op: CompleteOperation) -> (StatusCode, Bytes) {
        let res = op.response().await.unwrap();
        let status = res.status();
        (status, res.into_bytes().await.unwrap())
    }

    #[tokio::test]
    async fn test_path_variable_continuation() {
        let ctx = context("/test/123", "");
        let op = ctx.path_variable(int_var("id"), |id| ok(id));
        assert_eq!(resolve(op).await, (StatusCode::OK, Bytes::from("123")));
    }

    #[tokio::test]
    async fn test_failed_extraction_is_400_response() {
        let ctx = context("/test/123?other=1", "");
        let op = ctx.query_parameter(int_param("v"), |v| ok(v));
        let (status, body) = resolve(op).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing required query parameter v.");
    }

    #[tokio::test]
    async fn test_nested_extraction_borrows_context() {
        let ctx = context("/test/123?page=4", "");
        let op = ctx.path_variable(int_var("id"), |id| {
            ctx.query_parameter(int_param("page"), |page| ok(id * page))
        });
        assert_eq!(resolve(op).await, (StatusCode::OK, Bytes::from("492")));
    }

    #[tokio::test]
    async fn test_parameters_tuple() {
        let ctx = context("/test/123?a=1&b=2", "");
        let op = ctx.parameters((int_param("a"), int_param("b")), |(a, b)| ok(a + b));
        assert_eq!(resolve(op).await, (StatusCode::OK, Bytes::from("3")));
        let op = ctx.parameters((int_param("a"), int_param("c")), |(a, c)| ok(a + c));
        let (status, body) = resolve(op).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing required query parameter c.");
    }

    #[tokio::test]
    async fn test_extract_request() {
        let ctx = context("/test/123", "");
        let op = ctx.extract_request(|req| ok(req.path().to_owned()));
        assert_eq!(resolve(op).await, (StatusCode::OK, Bytes::from("\"/test/123\"")));
    }

    #[tokio::test]
    async fn test_execute_wraps_sub_handler_response() {
        let ctx = context("/test/123", "");
        let inner = ctx.execute(|ctx| ctx.path_variable(int_var("id"), |id| ok(id)));
        let op = complete_async(StatusCode::OK, crate::value::from_future(async move {
            let res = inner.await?;
            Ok::<_, Error>(format!("inner answered {}", res.status().as_u16()))
        }));
        assert_eq!(resolve(op.into()).await, (StatusCode::OK, Bytes::from("\"inner answered 200\"")));
    }

    #[tokio::test]
    async fn test_with_body() {
        let ctx = context("/users", r#"{"name":"alice"}"#);
        let op = ctx.with_body(|user: NewUser| complete_with(StatusCode::CREATED, user.name));
        assert_eq!(resolve(op).await, (StatusCode::CREATED, Bytes::from("\"alice\"")));
    }

    #[tokio::test]
    async fn test_with_body_missing_and_malformed() {
        let missing = context("/users", "").with_body(|user: NewUser| ok(user.name));
        assert_eq!(
            resolve(missing).await,
            (StatusCode::BAD_REQUEST, Bytes::from("Missing required request body."))
        );
        let malformed = context("/users", "{").with_body(|user: NewUser| ok(user.name));
        assert_eq!(
            resolve(malformed).await,
            (StatusCode::BAD_REQUEST, Bytes::from("Failed to read request body."))
        );
    }

    #[tokio::test]
    async fn test_body_as_chainable_value() {
        let present = complete_async(StatusCode::OK, context("/users", r#"{"name":"bob"}"#).body::<NewUser>())
            .map(|user| user.name)
            .or(not_found());
        assert_eq!(resolve(present).await, (StatusCode::OK, Bytes::from("\"bob\"")));
        let absent = complete_async(StatusCode::OK, context("/users", "").body::<NewUser>())
            .map(|user| user.name)
            .or(not_found());
        assert_eq!(resolve(absent).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_stream() {
        let ctx = context("/batch", "[1,2,3]");
        let items: Vec<i32> = ctx.body_stream::<i32>().try_collect().await.unwrap();
        assert_eq!(items, [1, 2, 3]);
        let empty: Vec<i32> = context("/batch", "").body_stream::<i32>().try_collect().await.unwrap();
        assert!(empty.is_empty());
        assert!(context("/batch", "{}").body_stream::<i32>().try_collect::<Vec<_>>().await.is_err());
    }
}
