//! # Lifecycle events emitted by paging flows.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Subscriber events**: subscribers joining, leaving, or being rejected
//! - **Upstream events**: activation windows of the upstream (started, stopped, completed, failed)
//! - **Terminal events**: cancellation and closure of the flow
//! - **Observer events**: an observer dropped an event or panicked while handling one
//!
//! The [`Event`] struct carries additional metadata such as timestamps, flow name,
//! subscriber count and the activation number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use paging_flow::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::UpstreamFailed)
//!     .with_flow("feed")
//!     .with_reason("boom")
//!     .with_activation(2);
//!
//! assert_eq!(ev.kind, EventKind::UpstreamFailed);
//! assert_eq!(ev.flow.as_deref(), Some("feed"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of flow events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Observer panicked while handling a flow event.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `observer`: observer name
    /// - `reason`: panic message
    ObserverPanicked,

    /// Observer missed a flow event (queue full or worker gone).
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `observer`: observer name
    /// - `reason`: `"full"` or `"closed"`
    ObserverOverflow,

    // === Subscriber events ===
    /// A subscriber attached to the flow.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `subscribers`: live count after the join
    SubscriberJoined,

    /// A subscriber released its subscription.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `subscribers`: live count after the release
    SubscriberLeft,

    /// A subscribe call hit the subscriber cap.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `subscribers`: live count at rejection time
    /// - `reason`: error label
    SubscriberRejected,

    // === Upstream events ===
    /// A consumption task opened the upstream.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `activation`: activation number (1-based)
    UpstreamStarted,

    /// The consumption task was stopped (no subscriber left, or the flow was cancelled).
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `activation`: activation number
    UpstreamStopped,

    /// The upstream finished on its own.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `activation`: activation number
    UpstreamCompleted,

    /// The upstream yielded an error (treated as completion, never retried).
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `activation`: activation number
    /// - `reason`: error message
    UpstreamFailed,

    // === Terminal events ===
    /// `cancel()` was called on a flow that was still open.
    ///
    /// Sets:
    /// - `flow`: flow name
    CancelRequested,

    /// The flow emitted its closed marker and will never forward values again.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `reason`: why the flow closed
    FlowClosed,

    /// The coordinator task panicked.
    ///
    /// Sets:
    /// - `flow`: flow name
    /// - `reason`: panic code
    CoordinatorDead,
}

/// Flow event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Human-readable reason (errors, close cause, overflow details).
    pub reason: Option<Arc<str>>,
    /// Activation number of the upstream (starting from 1).
    pub activation: Option<u32>,
    /// Live subscriber count when the event was produced.
    pub subscribers: Option<usize>,
    /// Name of the flow.
    pub flow: Option<Arc<str>>,
    /// Name of the observer, for observer events.
    pub observer: Option<&'static str>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            reason: None,
            activation: None,
            subscribers: None,
            flow: None,
            observer: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a flow name.
    #[inline]
    pub fn with_flow(mut self, flow: impl Into<Arc<str>>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    /// Attaches an activation number.
    #[inline]
    pub fn with_activation(mut self, n: u32) -> Self {
        self.activation = Some(n);
        self
    }

    /// Attaches the live subscriber count.
    #[inline]
    pub fn with_subscribers(mut self, n: usize) -> Self {
        self.subscribers = Some(n);
        self
    }

    /// Creates an observer overflow event.
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::ObserverOverflow).with_reason(reason);
        ev.observer = Some(observer);
        ev
    }

    /// Creates an observer panic event.
    pub fn observer_panicked(observer: &'static str, info: impl Into<Arc<str>>) -> Self {
        let mut ev = Event::new(EventKind::ObserverPanicked).with_reason(info);
        ev.observer = Some(observer);
        ev
    }

    /// Returns `true` for events that report on observers rather than on the flow.
    ///
    /// A failure while handling one of these is never reported again, so a
    /// broken observer cannot feed the bus with reports about itself.
    #[inline]
    pub fn is_observer_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ObserverOverflow | EventKind::ObserverPanicked
        )
    }
}
