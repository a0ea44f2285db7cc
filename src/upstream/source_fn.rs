//! # Function-backed upstream (`UpstreamFn`)
//!
//! [`UpstreamFn`] wraps a closure `F: Fn() -> S`, producing a fresh stream per
//! activation. This avoids shared mutable state between activations.
//!
//! ## Concurrency semantics
//! - Each call to [`Upstream::open`] creates a **new** stream owning its own state.
//! - Nothing is carried over between activations; if shared state is needed,
//!   capture an `Arc<...>` explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use futures::stream;
//! use paging_flow::{UpstreamFn, UpstreamRef, UpstreamError};
//!
//! let pages: UpstreamRef<u32> = UpstreamFn::arc("pages", || {
//!     stream::iter(vec![Ok::<_, UpstreamError>(1), Ok(2)])
//! });
//!
//! assert_eq!(pages.name(), "pages");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::error::UpstreamError;
use crate::upstream::source::{Upstream, UpstreamStream};

/// Function-backed upstream implementation.
///
/// Wraps a closure that *creates* a new stream per activation.
#[derive(Debug)]
pub struct UpstreamFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> UpstreamFn<F> {
    /// Creates a new function-backed upstream.
    ///
    /// Prefer [`UpstreamFn::arc`] when you immediately need an [`UpstreamRef`](crate::UpstreamRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the upstream and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, S, T> Upstream<T> for UpstreamFn<F>
where
    F: Fn() -> S + Send + Sync + 'static, // Fn, not FnMut
    S: Stream<Item = Result<T, UpstreamError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> UpstreamStream<T> {
        (self.f)().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_every_open_starts_from_the_beginning() {
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = opened.clone();
        let up = UpstreamFn::new("pages", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            stream::iter(vec![Ok::<u32, UpstreamError>(1), Ok(2)])
        });

        let first: Vec<_> = up.open().collect().await;
        let second: Vec<_> = up.open().collect().await;

        assert_eq!(first, vec![Ok(1), Ok(2)]);
        assert_eq!(second, first);
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(Upstream::<u32>::name(&up), "pages");
    }
}
