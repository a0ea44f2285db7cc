//! # Shared broadcast channel with replay-of-latest.
//!
//! [`Channel`] fans values out to any number of subscriber [`Inbox`]es and
//! remembers the latest published value, so a subscriber joining late first
//! receives the current value before anything newer.
//!
//! ## Architecture
//! ```text
//!   consumer ── publish(v) ──► Channel ──► latest = Value(v)
//!                                 ├──────► [outbox S1] ─► Inbox ─► Subscription::recv()
//!                                 ├──────► [outbox S2] ─► Inbox ─► Subscription::recv()
//!                                 └──────► [outbox SN] ─► Inbox ─► Subscription::recv()
//!
//!   coordinator ── reset_latest() ──► latest = Empty (flow went back to Idle)
//!   coordinator ── close() ──► latest = Closed, every inbox ends after its pending values
//! ```
//!
//! ## Delivery
//! - [`Delivery::Latest`]: one [`LatestSlot`] per subscriber holding at most one pending
//!   value; a slow subscriber skips intermediate values but still sees the newest one
//!   before the closed marker. An mpsc queue cannot overwrite a queued value, hence the
//!   hand-written slot.
//! - [`Delivery::Unbounded`]: a `tokio::sync::mpsc` unbounded queue per subscriber;
//!   closing drops the sender, so the receiver drains every queued value and then ends.
//!
//! ## Rules
//! - **Single writer**: only the active consumer publishes, only the coordinator resets or closes.
//! - **Atomic replay**: `attach` snapshots `latest` and registers the outbox under one lock,
//!   so no value can slip between the replay and the live feed.
//! - **Closed is terminal**: after `close`, `publish` and `reset_latest` are no-ops and new
//!   inboxes are born finished.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, mpsc};

/// Per-subscriber delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Keep only the newest pending value for each subscriber.
    Latest,
    /// Queue every value for each subscriber, without bound.
    Unbounded,
}

/// Latest-value cell.
#[derive(Debug)]
enum Latest<T> {
    Empty,
    Value(T),
    Closed,
}

fn lock<G>(m: &Mutex<G>) -> MutexGuard<'_, G> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Pending<T> {
    value: Option<T>,
    closed: bool,
}

/// Single pending value of one conflating subscriber.
pub(crate) struct LatestSlot<T> {
    pending: Mutex<Pending<T>>,
    notify: Notify,
}

impl<T> LatestSlot<T> {
    fn new(value: Option<T>) -> Self {
        Self {
            pending: Mutex::new(Pending {
                value,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    fn put(&self, value: T) {
        {
            let mut pending = lock(&self.pending);
            if pending.closed {
                return;
            }
            pending.value = Some(value);
        }
        self.notify.notify_one();
    }

    fn close(&self) {
        lock(&self.pending).closed = true;
        self.notify.notify_one();
    }

    /// Cancel-safe: the slot is checked before every wait.
    async fn recv(&self) -> Option<T> {
        loop {
            {
                let mut pending = lock(&self.pending);
                if let Some(v) = pending.value.take() {
                    return Some(v);
                }
                if pending.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    fn is_finished(&self) -> bool {
        let pending = lock(&self.pending);
        pending.closed && pending.value.is_none()
    }
}

/// Receiving side of one subscriber.
pub(crate) enum Inbox<T> {
    Latest(Arc<LatestSlot<T>>),
    Queue(mpsc::UnboundedReceiver<T>),
}

impl<T> Inbox<T> {
    /// An inbox that yields nothing but the closed marker.
    pub(crate) fn finished() -> Self {
        let slot = LatestSlot::new(None);
        slot.close();
        Inbox::Latest(Arc::new(slot))
    }

    /// Waits for the next value; `None` once the closed marker is reached.
    ///
    /// Cancel-safe for both delivery modes.
    pub(crate) async fn recv(&mut self) -> Option<T> {
        match self {
            Inbox::Latest(slot) => slot.recv().await,
            Inbox::Queue(rx) => rx.recv().await,
        }
    }

    /// Returns `true` if the next item is the closed marker.
    pub(crate) fn is_finished(&self) -> bool {
        match self {
            Inbox::Latest(slot) => slot.is_finished(),
            Inbox::Queue(rx) => rx.is_closed() && rx.is_empty(),
        }
    }
}

/// Sending side of one subscriber, owned by the channel.
enum Outbox<T> {
    Latest(Arc<LatestSlot<T>>),
    Queue(mpsc::UnboundedSender<T>),
}

struct Inner<T> {
    latest: Latest<T>,
    next_id: u64,
    outboxes: HashMap<u64, Outbox<T>>,
}

/// Multi-subscriber broadcast with replay-of-latest and a closed marker.
pub(crate) struct Channel<T> {
    inner: Mutex<Inner<T>>,
    delivery: Delivery,
}

impl<T> Channel<T> {
    pub(crate) fn new(delivery: Delivery) -> Self {
        Self {
            inner: Mutex::new(Inner {
                latest: Latest::Empty,
                next_id: 0,
                outboxes: HashMap::new(),
            }),
            delivery,
        }
    }

    pub(crate) fn detach(&self, id: u64) {
        lock(&self.inner).outboxes.remove(&id);
    }

    /// Forgets the latest value so the next subscriber starts from fresh data.
    ///
    /// Inboxes already attached keep whatever they have pending.
    pub(crate) fn reset_latest(&self) {
        let mut inner = lock(&self.inner);
        if !matches!(inner.latest, Latest::Closed) {
            inner.latest = Latest::Empty;
        }
    }

    /// Emits the closed marker; returns `true` only for the call that closed the channel.
    pub(crate) fn close(&self) -> bool {
        let mut inner = lock(&self.inner);
        if matches!(inner.latest, Latest::Closed) {
            return false;
        }
        inner.latest = Latest::Closed;
        for (_, outbox) in inner.outboxes.drain() {
            if let Outbox::Latest(slot) = outbox {
                slot.close();
            }
        }
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(lock(&self.inner).latest, Latest::Closed)
    }

    #[cfg(test)]
    pub(crate) fn outbox_count(&self) -> usize {
        lock(&self.inner).outboxes.len()
    }
}

impl<T: Clone> Channel<T> {
    /// Registers an inbox seeded with the latest value.
    pub(crate) fn attach(&self) -> (u64, Inbox<T>) {
        let mut inner = lock(&self.inner);
        let seed = match &inner.latest {
            Latest::Empty => None,
            Latest::Value(v) => Some(v.clone()),
            Latest::Closed => return (u64::MAX, Inbox::finished()),
        };

        let (outbox, inbox) = match self.delivery {
            Delivery::Latest => {
                let slot = Arc::new(LatestSlot::new(seed));
                (Outbox::Latest(Arc::clone(&slot)), Inbox::Latest(slot))
            }
            Delivery::Unbounded => {
                let (tx, rx) = mpsc::unbounded_channel();
                if let Some(v) = seed {
                    let _ = tx.send(v);
                }
                (Outbox::Queue(tx), Inbox::Queue(rx))
            }
        };

        let id = inner.next_id;
        inner.next_id += 1;
        inner.outboxes.insert(id, outbox);
        (id, inbox)
    }

    /// Publishes a value to every inbox; returns `false` if the channel is closed.
    pub(crate) fn publish(&self, value: T) -> bool {
        let mut inner = lock(&self.inner);
        if matches!(inner.latest, Latest::Closed) {
            return false;
        }
        for outbox in inner.outboxes.values() {
            match outbox {
                Outbox::Latest(slot) => slot.put(value.clone()),
                // Receiver gone means the subscription is being dropped; its lease detaches it.
                Outbox::Queue(tx) => {
                    let _ = tx.send(value.clone());
                }
            }
        }
        inner.latest = Latest::Value(value);
        true
    }
}
