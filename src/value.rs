//! Asynchronous values the DSL composes over.
//!
//! An [`AsyncValue`] resolves at most once to a value, to nothing, or to an
//! error. A [`ValueStream`] yields any number of values. Neither does anything
//! until it is polled.

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::{BoxError, Error, Result};

/// A lazily evaluated value that may be absent or may fail.
pub type AsyncValue<T> = BoxFuture<'static, Result<Option<T>>>;

/// A lazily evaluated sequence of values, any of which may fail.
pub type ValueStream<T> = BoxStream<'static, Result<T>>;

/// An async value that resolves to `value`.
pub fn just<T: Send + 'static>(value: T) -> AsyncValue<T> {
    future::ready(Ok(Some(value))).boxed()
}

/// An async value that resolves to nothing.
pub fn nothing<T: Send + 'static>() -> AsyncValue<T> {
    future::ready(Ok(None)).boxed()
}

/// An async value that resolves to `value` when it is `Some`, nothing otherwise.
pub fn from_option<T: Send + 'static>(value: Option<T>) -> AsyncValue<T> {
    future::ready(Ok(value)).boxed()
}

/// Adapts a fallible future. A failure keeps its status if it is an [`Error`].
pub fn from_future<F, T, E>(fut: F) -> AsyncValue<T>
where
    F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<BoxError>,
{
    fut.map(|res| res.map(Some).map_err(|e| Error::from_boxed(e.into()))).boxed()
}

/// A stream over the items of `iter`.
pub fn stream_iter<I>(iter: I) -> ValueStream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    stream::iter(iter).map(Ok).boxed()
}
