//! Mounting a handler on a hyper-based host.
//!
//! [`HandlerService`] is what a host router calls per matched route. It
//! buffers the request body, runs the handler and translates a surfaced
//! [`Error`] into a response, so the host only ever sees `Ok`.
//!
//! ```rust,ignore
//! let svc = HandlerService::new(handler(|ctx| ctx.path_variable(int_var("id"), ok)));
//! // in the accept loop, after routing:
//! parts.extensions.insert(PathParams::from_iter(matched.params.iter()));
//! svc.call(http::Request::from_parts(parts, body)).await
//! ```

use std::convert::Infallible;
use std::fmt;

use futures::FutureExt;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use tracing::{debug, error};

use crate::error::{BoxError, Error};
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{IntoResponse, Response, ResponseBody};

/// A [`Handler`] ready to serve hyper requests.
///
/// Cheap to clone: the handler is shared.
#[derive(Clone)]
pub struct HandlerService {
    handler: BoxedHandler,
    expose_internal_errors: bool,
}

impl HandlerService {
    pub fn new(handler: impl Handler) -> Self {
        Self {
            handler: handler.into_boxed_handler(),
            expose_internal_errors: false,
        }
    }

    /// Whether `5xx` responses carry the error's description instead of the
    /// bare reason phrase. Off by default; meant for development.
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Runs the handler on an already buffered request.
    pub async fn dispatch(&self, req: Request) -> Response {
        match self.handler.call(req).await {
            Ok(response) => response,
            Err(err) => self.translate(err),
        }
    }

    /// Maps a surfaced error to the response the client sees.
    pub fn translate(&self, err: Error) -> Response {
        let status = err.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %err, "handler failed");
            if self.expose_internal_errors {
                return Response::text(status, err.to_string());
            }
        } else {
            debug!(status = status.as_u16(), error = %err, "handler rejected request");
        }
        err.into_response()
    }
}

impl fmt::Debug for HandlerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerService")
            .field("expose_internal_errors", &self.expose_internal_errors)
            .finish_non_exhaustive()
    }
}

/// The error type is [`Infallible`]: every failure, including a body that
/// could not be read, becomes a response.
impl<B> hyper::service::Service<http::Request<B>> for HandlerService
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Infallible>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let svc = self.clone();
        async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => return Ok(svc.translate(Error::Body(e.into())).into_inner()),
            };
            let response = svc.dispatch(Request::from_parts(parts, body)).await;
            Ok(response.into_inner())
        }
        .boxed()
    }
}
