//! # Upstream abstraction.
//!
//! This module defines the [`Upstream`] trait: a named, pull-based producer of
//! page-load events. The common handle type is [`UpstreamRef`], an
//! `Arc<dyn Upstream<T>>` suitable for sharing with the coordinator.
//!
//! Every activation of a paging flow calls [`Upstream::open`] again and reads the
//! returned stream from its beginning. A stopped activation is never resumed.

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::error::UpstreamError;

/// Stream returned by [`Upstream::open`].
pub type UpstreamStream<T> = BoxStream<'static, Result<T, UpstreamError>>;

/// Shared handle to an upstream.
pub type UpstreamRef<T> = Arc<dyn Upstream<T>>;

/// # Producer of page-load events.
///
/// An `Upstream` has a stable [`name`](Upstream::name) and an [`open`](Upstream::open)
/// method returning a fresh stream. The flow drops the stream to stop consuming it,
/// so implementations release their resources in `Drop`.
///
/// # Example
/// ```
/// use futures::stream::{self, StreamExt};
/// use paging_flow::{Upstream, UpstreamError, UpstreamStream};
///
/// struct Pages;
///
/// impl Upstream<u32> for Pages {
///     fn name(&self) -> &str { "pages" }
///
///     fn open(&self) -> UpstreamStream<u32> {
///         stream::iter([1, 2, 3]).map(Ok::<_, UpstreamError>).boxed()
///     }
/// }
/// ```
pub trait Upstream<T>: Send + Sync + 'static {
    /// Returns a stable, human-readable name; it also names the flow.
    fn name(&self) -> &str;

    /// Starts a new pass over the source.
    ///
    /// Called once per activation window. The first `Err` ends the pass.
    fn open(&self) -> UpstreamStream<T>;
}
