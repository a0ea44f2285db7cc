//! # Upstream abstractions.
//!
//! This module provides the upstream-related types:
//! - [`Upstream`] - trait for producers of page-load events
//! - [`UpstreamFn`] - closure-based upstream implementation
//! - [`UpstreamRef`] - shared reference to an upstream (`Arc<dyn Upstream<T>>`)
//! - [`UpstreamStream`] - the boxed stream an activation reads from

mod source;
mod source_fn;

pub use source::{Upstream, UpstreamRef, UpstreamStream};
pub use source_fn::UpstreamFn;
