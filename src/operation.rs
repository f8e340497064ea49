//! Completion operations: how a handler eventually produces its response.
//!
//! Every DSL call ends in a [`CompleteOperation`]. It comes in three shapes:
//!
//! ```text
//! Terminating   always yields its own response (or its own error)
//! Chainable     yields a response only if it holds a value; otherwise
//!               defers to its fallback, and with no fallback left answers
//!               an empty response of its own status
//! Nested        a future of another CompleteOperation, resolved first
//! ```
//!
//! `a.or(b)` links `b` in as the fallback of `a`. Chains are singly linked and
//! owned front to back, so `x.or(y).or(z)` is `x -> y -> z` and resolution walks
//! them left to right:
//!
//! ```text
//! x has a value?  yes -> x's response
//!                 no  -> y has a value?  yes -> y's response
//!                                        no  -> z's response, unconditionally
//! ```
//!
//! Nothing runs until [`CompleteOperation::response`] is polled, and each
//! operand is fully awaited before the next one is tried.

use futures::future::{self, BoxFuture, FutureExt};
use futures::TryFutureExt;
use http::StatusCode;
use serde::Serialize;
use tracing::trace;

use crate::error::{Error, Result};
use crate::response::{Response, ResponseBuilder};
use crate::value::AsyncValue;

/// What a chainable operand found when it was asked for its value.
enum Attempt {
    /// The operand had a value and built a response from it.
    Value(Response),
    /// The operand was empty. Carries the response to use if nothing follows.
    Empty(Response),
}

enum Step {
    Terminating(BoxFuture<'static, Result<Response>>),
    Chainable(BoxFuture<'static, Result<Attempt>>),
    Nested(BoxFuture<'static, Result<CompleteOperation>>),
}

/// A value describing how to eventually produce an HTTP response.
///
/// Build one with the `complete*` functions, [`fail_with`](crate::fail_with),
/// or an extractor on [`HandlerContext`](crate::HandlerContext). Combine with
/// [`or`](Self::or). Resolve with [`response`](Self::response).
#[must_use = "a completion operation does nothing until its response is awaited"]
pub struct CompleteOperation {
    step: Step,
    fallback: Option<Box<CompleteOperation>>,
}

impl CompleteOperation {
    fn new(step: Step) -> Self {
        Self { step, fallback: None }
    }

    /// An operation that always yields `fut`'s outcome.
    pub fn terminating<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Response>> + Send + 'static,
    {
        Self::new(Step::Terminating(fut.boxed()))
    }

    /// An operation that awaits `fut` and continues with the operation it yields.
    pub fn nested<F>(fut: F) -> Self
    where
        F: Future<Output = Result<CompleteOperation>> + Send + 'static,
    {
        Self::new(Step::Nested(fut.boxed()))
    }

    /// A chainable operation with no value: always defers to its fallback.
    pub fn empty(builder: ResponseBuilder) -> Self {
        let attempt = future::ready(Ok(Attempt::Empty(builder.no_body())));
        Self::new(Step::Chainable(attempt.boxed()))
    }

    pub(crate) fn respond(response: Response) -> Self {
        Self::terminating(future::ready(Ok(response)))
    }

    pub(crate) fn fail(err: Error) -> Self {
        Self::terminating(future::ready(Err(err)))
    }

    /// Whether this operation can defer to a fallback.
    ///
    /// A nested operation is not known to be chainable until it resolves.
    pub fn is_chainable(&self) -> bool {
        matches!(self.step, Step::Chainable(_))
    }

    /// Uses `next` when this operation (and everything already chained after it)
    /// turns out to be empty.
    pub fn or(mut self, next: impl Into<CompleteOperation>) -> Self {
        self.append(next.into());
        self
    }

    fn append(&mut self, next: CompleteOperation) {
        if let Some(tail) = self.fallback.as_mut() {
            tail.append(next);
        } else {
            self.fallback = Some(Box::new(next));
        }
    }

    /// Resolves the chain into the single response it stands for.
    pub fn response(self) -> BoxFuture<'static, Result<Response>> {
        async move {
            let mut current = self;
            loop {
                let CompleteOperation { step, fallback } = current;
                match step {
                    Step::Terminating(fut) => return fut.await,
                    Step::Chainable(attempt) => match (attempt.await?, fallback) {
                        (Attempt::Value(response), _) => return Ok(response),
                        (Attempt::Empty(default), None) => return Ok(default),
                        (Attempt::Empty(_), Some(next)) => {
                            trace!("chainable operand empty, trying fallback");
                            current = *next;
                        }
                    },
                    Step::Nested(inner) => {
                        let mut inner = inner.await?;
                        if let Some(next) = fallback {
                            inner.append(*next);
                        }
                        current = inner;
                    }
                }
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for CompleteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.step {
            Step::Terminating(_) => "Terminating",
            Step::Chainable(_) => "Chainable",
            Step::Nested(_) => "Nested",
        };
        f.debug_struct("CompleteOperation")
            .field("kind", &kind)
            .field("fallback", &self.fallback)
            .finish()
    }
}

// ── Chainable ─────────────────────────────────────────────────────────────────

/// A chainable operation that still knows the type of its value.
///
/// Keeps `T` around so it can be [`map`](Self::map)ped or
/// [`flat_map`](Self::flat_map)ped before it is turned into a
/// [`CompleteOperation`]. The value is serialized as JSON.
#[must_use = "a completion operation does nothing until its response is awaited"]
pub struct Chainable<T> {
    builder: ResponseBuilder,
    value: AsyncValue<T>,
}

impl<T: Send + 'static> Chainable<T> {
    pub fn new(builder: ResponseBuilder, value: AsyncValue<T>) -> Self {
        Self { builder, value }
    }

    pub fn status(&self) -> StatusCode {
        self.builder.status_code()
    }

    /// Customizes the response (headers, status) built from the value, or the
    /// empty response used when there is no value and no fallback.
    pub fn with_builder(mut self, f: impl FnOnce(ResponseBuilder) -> ResponseBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    /// Transforms the carried value. Status and builder stay as they are.
    pub fn map<U, F>(self, f: F) -> Chainable<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Chainable {
            builder: self.builder,
            value: self.value.map_ok(|value| value.map(f)).boxed(),
        }
    }

    /// Turns a present value into a whole new operation.
    ///
    /// `f` receives this operation's builder (status and headers) and the
    /// value. An empty value stays empty and defers to the fallback.
    pub fn flat_map<R, F>(self, f: F) -> CompleteOperation
    where
        R: Into<CompleteOperation>,
        F: FnOnce(ResponseBuilder, T) -> R + Send + 'static,
    {
        let Chainable { builder, value } = self;
        CompleteOperation::nested(async move {
            Ok(match value.await? {
                Some(value) => f(builder, value).into(),
                None => CompleteOperation::empty(builder),
            })
        })
    }

    /// Like [`flat_map`](Self::flat_map), with `f` producing the operation
    /// asynchronously.
    pub fn flat_map_async<R, Fut, F>(self, f: F) -> CompleteOperation
    where
        R: Into<CompleteOperation>,
        Fut: Future<Output = Result<R>> + Send + 'static,
        F: FnOnce(ResponseBuilder, T) -> Fut + Send + 'static,
    {
        let Chainable { builder, value } = self;
        CompleteOperation::nested(async move {
            Ok(match value.await? {
                Some(value) => f(builder, value).await?.into(),
                None => CompleteOperation::empty(builder),
            })
        })
    }
}

impl<T: Serialize + Send + 'static> Chainable<T> {
    pub fn or(self, next: impl Into<CompleteOperation>) -> CompleteOperation {
        CompleteOperation::from(self).or(next)
    }

    pub fn response(self) -> BoxFuture<'static, Result<Response>> {
        CompleteOperation::from(self).response()
    }
}

impl<T: Serialize + Send + 'static> From<Chainable<T>> for CompleteOperation {
    fn from(chainable: Chainable<T>) -> Self {
        let Chainable { builder, value } = chainable;
        let attempt = async move {
            match value.await? {
                Some(value) => Ok(Attempt::Value(builder.json(&value)?)),
                None => Ok(Attempt::Empty(builder.no_body())),
            }
        };
        CompleteOperation::new(Step::Chainable(attempt.boxed()))
    }
}
