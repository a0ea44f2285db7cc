//! # ObserverSet: the observers of one flow.
//!
//! Built by [`PagingFlowBuilder::build`](crate::PagingFlowBuilder::build) when
//! observers are configured. [`ObserverSet::run`] follows the flow's bus and
//! hands every event to each observer that [`accepts`](Observe::accepts) it,
//! through a bounded queue drained by that observer's own worker.
//!
//! ## Failure reporting
//! Observer failures are flow events too, published back on the same bus:
//! - queue full or worker gone → `ObserverOverflow { observer, reason: "full" | "closed" }`
//! - `on_event` panicked → `ObserverPanicked { observer, reason: <panic message> }`
//!
//! A failure that happens while handling an observer event is only logged.
//! Otherwise a full queue or a panicking observer would keep feeding the bus
//! with reports about itself.
//!
//! ## Lifetime
//! ```text
//! run(bus.subscribe())
//!   loop: recv ──► emit ──► [queue O1] ─► worker O1 ─► on_event()
//!                     └──► [queue ON] ─► worker ON ─► on_event()
//!   bus closed (flow handle and every subscription dropped) ──► close queues ──► join workers
//! ```
//! The set and its workers only hold a [`WeakBus`], so they never keep the bus open.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::events::{Event, WeakBus};

use super::Observe;

struct Queue {
    observer: Arc<dyn Observe>,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Observers of one flow, each behind its own queue and worker.
pub(crate) struct ObserverSet {
    queues: Vec<Queue>,
    workers: Vec<JoinHandle<()>>,
    bus: WeakBus,
}

impl ObserverSet {
    /// Spawns one worker per observer; failures are reported on `bus`.
    ///
    /// Must be called within a Tokio runtime.
    pub(crate) fn new(observers: Vec<Arc<dyn Observe>>, bus: WeakBus) -> Self {
        let mut queues = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for observer in observers {
            let (tx, rx) = mpsc::channel(observer.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(Arc::clone(&observer), rx, bus.clone())));
            queues.push(Queue { observer, tx });
        }

        Self {
            queues,
            workers,
            bus,
        }
    }

    /// Follows the bus until it closes, then shuts the workers down.
    pub(crate) async fn run(self, mut rx: broadcast::Receiver<Event>) {
        loop {
            match rx.recv().await {
                Ok(ev) => self.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "observers lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        self.shutdown().await;
    }

    /// Queues `event` for every observer that accepts its kind, without waiting.
    pub(crate) fn emit(&self, event: &Event) {
        let event = Arc::new(event.clone());
        for queue in &self.queues {
            if !queue.observer.accepts(event.kind) {
                continue;
            }
            let reason = match queue.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };

            let observer = queue.observer.name();
            tracing::warn!(observer, seq = event.seq, reason, "observer missed an event");
            if !event.is_observer_event() {
                self.bus.publish(Event::observer_overflow(observer, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub(crate) async fn shutdown(self) {
        drop(self.queues);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn worker(observer: Arc<dyn Observe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: WeakBus) {
    while let Some(ev) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(observer.on_event(&ev))
            .catch_unwind()
            .await;
        if let Err(panic) = handled {
            let message = panic_message(panic.as_ref());
            tracing::warn!(observer = observer.name(), %message, "observer panicked");
            if !ev.is_observer_event() {
                bus.publish(Event::observer_panicked(observer.name(), message));
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
