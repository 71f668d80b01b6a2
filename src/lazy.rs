//! Deferred, memoized evaluation.
//!
//! - [`MemoCell`]: infallible, synchronous, computes once even under racing readers.
//! - [`MemoCellFallible`]: async and fallible; failures are not cached, so the next
//!   call retries the producer with whatever cancellation token it is given.
//!
//! `MemoCellFallible` runs a single producer at a time. Callers racing on an empty
//! cell wait for the in-flight attempt instead of starting their own; if that
//! attempt fails, the next waiter runs the producer with its own token.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A value computed from a zero-argument producer at most once.
pub struct MemoCell<T, F = Box<dyn FnOnce() -> T + Send>> {
    inner: once_cell::sync::Lazy<T, F>,
}

impl<T, F: FnOnce() -> T> MemoCell<T, F> {
    pub const fn new(producer: F) -> Self {
        Self {
            inner: once_cell::sync::Lazy::new(producer),
        }
    }

    /// Run the producer on first access, return the cached value afterwards.
    pub fn get(&self) -> &T {
        once_cell::sync::Lazy::force(&self.inner)
    }

    pub fn is_computed(&self) -> bool {
        once_cell::sync::Lazy::get(&self.inner).is_some()
    }
}

impl<T> MemoCell<T> {
    /// Type-erased constructor, convenient when the cell is stored in a struct field.
    pub fn boxed(producer: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::new(Box::new(producer))
    }
}

impl<T: fmt::Debug, F: FnOnce() -> T> fmt::Debug for MemoCell<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match once_cell::sync::Lazy::get(&self.inner) {
            Some(value) => f.debug_tuple("MemoCell").field(value).finish(),
            None => f.write_str("MemoCell(<pending>)"),
        }
    }
}

type FallibleProducer<T, E> =
    Box<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A value produced by a fallible, cancellable async producer; cached only on success.
pub struct MemoCellFallible<T, E> {
    producer: FallibleProducer<T, E>,
    value: tokio::sync::OnceCell<T>,
}

impl<T, E> MemoCellFallible<T, E> {
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            producer: Box::new(move |cancel| Box::pin(producer(cancel))),
            value: tokio::sync::OnceCell::new(),
        }
    }

    /// Return the cached value, or run the producer with `cancel`.
    ///
    /// Once a value is cached the token is ignored and the producer never runs again.
    pub async fn get(&self, cancel: &CancellationToken) -> Result<&T, E> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        self.value
            .get_or_try_init(|| (self.producer)(cancel.clone()))
            .await
    }

    pub fn get_cached(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_computed(&self) -> bool {
        self.value.initialized()
    }

    /// Drop the cached value so the next `get` runs the producer again.
    pub fn reset(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T: fmt::Debug, E> fmt::Debug for MemoCellFallible<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCellFallible")
            .field("value", &self.value.get())
            .finish_non_exhaustive()
    }
}
