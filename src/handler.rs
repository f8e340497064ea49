//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A host holds handlers of *different* types side by side (one per route),
//! so each one is hidden behind a trait object (`dyn ErasedHandler`) and
//! stored uniformly.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! handler(|ctx| ctx.path_variable(int_var("id"), ok))   ← user writes this
//!        ↓ HandlerService::new(h)
//! h.into_boxed_handler()                                ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(h))                                ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                    ← one vtable dispatch
//!        ↓
//! block(&ctx).into().response()                         ← HandlerFuture
//! ```
//!
//! The only runtime cost per request is one `Arc` clone and one virtual call.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::HandlerContext;
use crate::error::Result;
use crate::operation::CompleteOperation;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future that resolves to a handler's outcome.
pub type HandlerFuture = BoxFuture<'static, Result<Response>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> HandlerFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid handler.
///
/// You never implement this yourself. It is satisfied by anything returned
/// from [`handler`], and by any function with the signature:
///
/// ```text
/// async fn name(req: Request) -> Result<Response>
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Holds a concrete handler `F` and implements [`ErasedHandler`] for it.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn call(&self, req: Request) -> HandlerFuture {
        (self.0)(req).boxed()
    }
}

/// Turns a DSL block into a [`Handler`].
///
/// The block runs once per request against a fresh [`HandlerContext`] and
/// returns the operation that produces the response.
///
/// ```rust
/// use tsu_dsl::extract::int_var;
/// use tsu_dsl::{handler, ok};
///
/// let h = handler(|ctx| ctx.path_variable(int_var("id"), |id| ok(id)));
/// ```
pub fn handler<B, R>(block: B) -> impl Handler
where
    B: Fn(&HandlerContext) -> R + Send + Sync + 'static,
    R: Into<CompleteOperation>,
{
    move |req: Request| -> HandlerFuture {
        let ctx = HandlerContext::new(req);
        block(&ctx).into().response()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::complete::{not_found, ok};
    use crate::error::Error;
    use crate::extract::int_param;

    fn request(uri: &str) -> Request {
        Request::new(http::Request::builder().uri(uri).body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_dsl_block_handler() {
        let h = handler(|ctx| ctx.query_parameter(int_param("v"), |v| ok(v))).into_boxed_handler();
        let res = h.call(request("/?v=5")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.into_bytes().await.unwrap(), "5");
    }

    #[tokio::test]
    async fn test_block_runs_per_request() {
        let h = handler(|ctx| ctx.query_parameter(int_param("v"), |v| ok(v))).into_boxed_handler();
        assert_eq!(h.call(request("/?v=1")).await.unwrap().status(), StatusCode::OK);
        assert_eq!(h.call(request("/")).await.unwrap().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plain_async_fn_handler() {
        async fn missing(_req: Request) -> Result<Response> {
            not_found().response().await
        }
        let res = missing.into_boxed_handler().call(request("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_handler_surfaces_error() {
        async fn broken(_req: Request) -> Result<Response> {
            Err(Error::internal("broken"))
        }
        let err = broken.into_boxed_handler().call(request("/")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
