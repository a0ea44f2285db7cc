//! # paging-flow
//!
//! **paging-flow** shares one paginated upstream between many subscribers.
//!
//! A [`PagingFlow`] reads its [`Upstream`] lazily (only once someone subscribes),
//! replays the latest page to every newcomer, optionally caps the number of
//! concurrent subscribers, optionally stops (and restarts) the upstream when
//! nobody is listening, and can be cancelled explicitly with a `cancel()` that
//! returns only once everything has stopped.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Subscription │   │ Subscription │   │ Subscription │
//!     │   (inbox)    │   │   (inbox)    │   │   (inbox)    │
//!     └──────▲───────┘   └──────▲───────┘   └──────▲───────┘
//!            │ replay latest    │ + live values    │ + closed marker
//! ┌──────────┴──────────────────┴──────────────────┴──────────────────┐
//! │  PagingFlow (public handle)                                       │
//! │  - Channel (replay-of-latest broadcast + closed marker)           │
//! │  - SubscriberRegistry (live count, cap check)                     │
//! │  - state: Idle / Active / Closed                                  │
//! │  - Bus (lifecycle events)                                         │
//! └──────┬──────────────────────────────────────────────────▲─────────┘
//!        │ count (watch)                                    │ publish(value)
//!        ▼                                                  │
//! ┌──────────────────────┐  spawn (child token)  ┌──────────┴─────────┐
//! │     Coordinator      │ ────────────────────► │   run_activation   │
//! │ (start/stop/restart, │ ◄──────────────────── │ (reads Upstream)   │
//! │   teardown on exit)  │   Completed/Failed    └────────────────────┘
//! └──────────┬───────────┘
//!            │ events
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Bus (broadcast channel)                        │
//! │                (capacity: PagingConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │   ObserverSet::run     │
//!                       └───────────┬────────────┘
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//!                         └─ overflow / panic ──► back on the Bus
//! ```
//!
//! ### Lifecycle
//! ```text
//! build() ──► Coordinator::run() (Idle, upstream untouched)
//!
//! subscribe() #1 ──► count 0→1 ──► activation 1 (Active)
//!                                     │
//!                                     ├─ values ──► every inbox (latest kept for newcomers)
//!                                     │
//!                                     ├─ upstream ends / fails ──────────────► Closed
//!                                     ├─ cancel() / scope cancelled ─────────► Closed
//!                                     └─ count → 0 && stop_on_zero_subscribers
//!                                           ├─ allow_restart_after_stop ──► Idle (next subscribe: activation 2)
//!                                           └─ otherwise ─────────────────► Closed
//!
//! Closed: every subscription ends, later subscriptions yield nothing.
//! ```
//!
//! ## Features
//! | Area               | Description                                                   | Key types / traits                         |
//! |--------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Flow**           | Share, cap, stop/restart and cancel one upstream.             | [`PagingFlow`], [`PagingFlowBuilder`]      |
//! | **Subscriptions**  | Receive replayed and live values until the flow closes.       | [`Subscription`]                           |
//! | **Upstreams**      | Define page sources as trait objects or closures.             | [`Upstream`], [`UpstreamFn`], [`UpstreamRef`] |
//! | **Observer API**   | Hook into lifecycle events (logging, metrics, custom).        | [`Observe`], [`Event`], [`EventKind`]      |
//! | **Errors**         | Typed errors for subscription and upstream failures.          | [`SubscribeError`], [`UpstreamError`]      |
//! | **Configuration**  | Centralize flow settings.                                     | [`PagingConfig`], [`Delivery`]             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use futures::{StreamExt, stream};
//! use paging_flow::{PagingConfig, PagingFlow, UpstreamError, UpstreamFn, UpstreamRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = PagingConfig::default();
//!     cfg.max_subscribers = 2;
//!
//!     // Build observers (optional)
//!     #[cfg(feature = "logging")]
//!     let observers: Vec<Arc<dyn paging_flow::Observe>> = vec![Arc::new(paging_flow::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let observers: Vec<Arc<dyn paging_flow::Observe>> = Vec::new();
//!
//!     // An upstream that loads two pages and completes
//!     let pages: UpstreamRef<Vec<&str>> = UpstreamFn::arc("pages", || {
//!         stream::iter(vec![Ok::<_, UpstreamError>(vec!["a", "b"]), Ok(vec!["c"])])
//!     });
//!
//!     let flow = PagingFlow::builder(pages)
//!         .with_config(cfg)
//!         .with_observers(observers)
//!         .build();
//!
//!     let first = flow.subscribe()?;
//!     let second = flow.subscribe()?;
//!     assert!(flow.subscribe().is_err());
//!
//!     let a: Vec<_> = first.into_stream().collect().await;
//!     let b: Vec<_> = second.into_stream().collect().await;
//!     assert_eq!(a.last(), b.last());
//!
//!     flow.cancel().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod observers;
mod upstream;

// ---- Public re-exports ----

pub use crate::core::{
    Delivery, FlowState, PagingConfig, PagingFlow, PagingFlowBuilder, Subscription,
};
pub use error::{SubscribeError, UpstreamError};
pub use events::{Event, EventKind};
pub use observers::Observe;
pub use upstream::{Upstream, UpstreamFn, UpstreamRef, UpstreamStream};

// Optional: expose a simple built-in logger observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
