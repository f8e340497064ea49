//! Bridging external futures into completion operations.
//!
//! [`on_complete`] hands the continuation the future's full outcome;
//! [`on_success`] only runs it on success and surfaces a failure as the
//! handler's error. Both take an optional [`Timeout`]: a future that has not
//! finished by then is dropped and the operation fails with
//! [`Error::Timeout`], which translates to `500`.
//!
//! ```rust,ignore
//! on_success(store.load(id), Some(Timeout::new(2, TimeUnit::Seconds)), |user| {
//!     complete_value(StatusCode::OK, user).or(not_found())
//! })
//! ```

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::error::{BoxError, Error, Result};
use crate::operation::CompleteOperation;

/// Units a [`Timeout`] can be expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn suffix(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "min",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

/// How long a bridged future may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timeout {
    value: u64,
    unit: TimeUnit,
}

impl Timeout {
    pub fn new(value: u64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// The timeout as a [`Duration`], saturating at [`Duration::MAX`].
    pub fn as_duration(&self) -> Duration {
        let secs = |per: u64| Duration::from_secs(self.value.saturating_mul(per));
        match self.unit {
            TimeUnit::Nanoseconds => Duration::from_nanos(self.value),
            TimeUnit::Microseconds => Duration::from_micros(self.value),
            TimeUnit::Milliseconds => Duration::from_millis(self.value),
            TimeUnit::Seconds => secs(1),
            TimeUnit::Minutes => secs(60),
            TimeUnit::Hours => secs(60 * 60),
            TimeUnit::Days => secs(24 * 60 * 60),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Self::new(nanos, TimeUnit::Nanoseconds)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Continues with `f` applied to the outcome of `fut`.
///
/// A failure is handed to `f` as an [`Error`]; an [`Error`] raised by `fut`
/// keeps its status. With a `timeout`, `f` receives [`Error::Timeout`] if
/// `fut` has not finished in time.
pub fn on_complete<Fut, T, E, R, F>(fut: Fut, timeout: Option<Timeout>, f: F) -> CompleteOperation
where
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<BoxError>,
    R: Into<CompleteOperation>,
    F: FnOnce(Result<T>) -> R + Send + 'static,
{
    CompleteOperation::nested(async move { Ok(f(settle(fut, timeout).await).into()) })
}

/// Continues with `f` applied to the value of `fut`, or surfaces its error.
///
/// The error (including a timeout) becomes the handler's outcome and is
/// translated by [`HandlerService`](crate::HandlerService), normally to `500`.
pub fn on_success<Fut, T, E, R, F>(fut: Fut, timeout: Option<Timeout>, f: F) -> CompleteOperation
where
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<BoxError>,
    R: Into<CompleteOperation>,
    F: FnOnce(T) -> R + Send + 'static,
{
    CompleteOperation::nested(async move { Ok(f(settle(fut, timeout).await?).into()) })
}

async fn settle<Fut, T, E>(fut: Fut, timeout: Option<Timeout>) -> Result<T>
where
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<BoxError>,
{
    let outcome = match timeout {
        None => fut.await,
        Some(timeout) => match tokio::time::timeout(timeout.as_duration(), fut).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(%timeout, "bridged future timed out");
                return Err(Error::Timeout(timeout));
            }
        },
    };
    outcome.map_err(|e| Error::from_boxed(e.into()))
}
