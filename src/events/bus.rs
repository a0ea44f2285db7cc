//! # Per-flow event bus.
//!
//! Every flow owns one [`Bus`]. Anything that publishes through it (the flow
//! handle, subscriptions, the coordinator, the activation runner and the
//! observer workers) gets its events stamped with the flow's name, so an
//! observer shared by several flows can tell them apart.
//!
//! ## Architecture
//! ```text
//! Publishers:                                   Listener:
//!   PagingFlow      ──┐
//!   Subscription    ──┤
//!   Coordinator     ──┼──► Bus (flow = "feed") ──► ObserverSet::run ──► workers
//!   run_activation  ──┤                                                  │
//!   observer worker ──┘ ◄── ObserverPanicked / ObserverOverflow ─────────┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receiver the event is dropped.
//! - Observer workers publish through a [`WeakBus`]: it does not keep the channel
//!   open, so the observers' listener ends once the flow and its subscriptions are gone.
//! - One ring buffer (capacity `PagingConfig::bus_capacity`) serves every receiver;
//!   a receiver that falls behind skips the oldest events (`RecvError::Lagged`).

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel of one flow's lifecycle events.
#[derive(Clone, Debug)]
pub(crate) struct Bus {
    tx: broadcast::Sender<Event>,
    flow: Arc<str>,
}

impl Bus {
    /// Creates a bus for `flow`; capacity is clamped to at least 1.
    pub(crate) fn new(flow: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self {
            tx,
            flow: flow.into(),
        }
    }

    /// Stamps the event with the flow name (unless already set) and broadcasts it.
    pub(crate) fn publish(&self, ev: Event) {
        send(&self.tx, &self.flow, ev);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub(crate) fn downgrade(&self) -> WeakBus {
        WeakBus {
            tx: self.tx.downgrade(),
            flow: Arc::clone(&self.flow),
        }
    }
}

/// Publishing handle that does not keep the bus open.
#[derive(Clone, Debug)]
pub(crate) struct WeakBus {
    tx: broadcast::WeakSender<Event>,
    flow: Arc<str>,
}

impl WeakBus {
    /// Like [`Bus::publish`]; a no-op once every [`Bus`] of the flow is gone.
    pub(crate) fn publish(&self, ev: Event) {
        if let Some(tx) = self.tx.upgrade() {
            send(&tx, &self.flow, ev);
        }
    }
}

fn send(tx: &broadcast::Sender<Event>, flow: &Arc<str>, mut ev: Event) {
    if ev.flow.is_none() {
        ev.flow = Some(Arc::clone(flow));
    }
    let _ = tx.send(ev);
}
