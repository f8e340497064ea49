//! Unified error type.

use http::StatusCode;
use thiserror::Error;

use crate::future::Timeout;

/// A type-erased error from user code or a foreign library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The error type carried by asynchronous responses.
///
/// Validation failures never reach this type on their own: extractors turn
/// them into `400` completion operations on the spot. An `Error` is what a
/// handler *surfaces* through [`fail_with`](crate::fail_with) or a failed
/// future, for [`HandlerService`](crate::HandlerService) to translate into a
/// response.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that already knows which HTTP status it maps to.
    #[error("{status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    /// A bridged future did not complete in time.
    #[error("timed out after {0}")]
    Timeout(Timeout),

    /// A response body could not be serialized.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The hosting runtime failed to deliver the request body.
    #[error("body: {0}")]
    Body(#[source] BoxError),

    /// Anything else, passed through from user code.
    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    /// A status error with no underlying cause.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status { status, message: message.into(), cause: None }
    }

    /// `400 Bad Request` with a human-readable message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    /// `400 Bad Request`, keeping the error that caused it.
    pub fn bad_request_with(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Status {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// `500 Internal Server Error` with a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Wraps a foreign error, unwrapping it again if it is already an `Error`.
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => *err,
            Err(err) => Self::Other(err),
        }
    }

    /// The HTTP status this error translates to.
    ///
    /// Only [`Error::Status`] carries its own status; everything else is a `500`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message that is safe to show a client, if any.
    pub(crate) fn public_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}
