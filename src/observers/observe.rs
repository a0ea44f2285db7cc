//! # Observing a paging flow.
//!
//! [`Observe`] lets callers watch a flow's lifecycle (who joined, when the
//! upstream was opened or stopped, why the flow closed) without sitting on the
//! value path. Observers are registered with
//! [`PagingFlowBuilder::with_observers`](crate::PagingFlowBuilder::with_observers).
//!
//! ## Delivery
//! ```text
//! Bus ──► ObserverSet ──accepts(kind)?──► [bounded queue] ──► worker ──► on_event()
//!                                                  │                        │
//!                                           full / closed                 panic
//!                                                  ▼                        ▼
//!                                     ObserverOverflow on the bus   ObserverPanicked on the bus
//! ```
//!
//! - Each observer has its own worker and queue; a slow or failing observer only
//!   loses its own events and never slows down subscribers or the upstream.
//! - Events are handled one at a time, in bus order.
//! - Kinds rejected by [`Observe::accepts`] never take a queue slot.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use paging_flow::{Event, EventKind, Observe};
//!
//! #[derive(Default)]
//! struct Restarts(AtomicUsize);
//!
//! #[async_trait]
//! impl Observe for Restarts {
//!     async fn on_event(&self, _ev: &Event) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn name(&self) -> &'static str { "restarts" }
//!
//!     fn accepts(&self, kind: EventKind) -> bool {
//!         kind == EventKind::UpstreamStarted
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Observer of one or more flows' lifecycle events.
///
/// `on_event` runs on the observer's own task. It should not block the
/// executor; a panic is caught and reported as
/// [`EventKind::ObserverPanicked`].
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name reported in `ObserverOverflow` / `ObserverPanicked` events.
    ///
    /// Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity of this observer (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }

    /// Whether this observer wants events of `kind`. Default: every kind.
    fn accepts(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }
}
