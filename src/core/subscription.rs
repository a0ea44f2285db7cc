//! # Subscription: one subscriber's view of a paging flow.
//!
//! A [`Subscription`] owns an inbox attached to the flow's channel and a lease
//! on one seat of the subscriber registry. Dropping it (or reaching the closed
//! marker) releases the seat, which is what the coordinator watches to decide
//! when to activate or stop the upstream.
//!
//! ## Rules
//! - The first value received is the latest value published before subscribing (if any).
//! - `recv()` returns `None` exactly when the flow has closed; it never hangs after close.
//! - The seat is released once, either on close or on drop, whichever comes first.

use std::sync::Arc;

use futures::{StreamExt, stream::BoxStream};

use crate::{
    core::{channel::Inbox, flow::FlowShared},
    events::{Event, EventKind},
};

/// Seat held by an attached subscription.
struct Lease<T> {
    shared: Arc<FlowShared<T>>,
    id: u64,
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        self.shared.channel.detach(self.id);
        let left = self.shared.registry.release();
        self.shared
            .publish(Event::new(EventKind::SubscriberLeft).with_subscribers(left));
    }
}

/// Handle of one subscriber.
///
/// Values are received with [`recv`](Subscription::recv) or by turning the
/// subscription into a stream with [`into_stream`](Subscription::into_stream).
pub struct Subscription<T> {
    inbox: Inbox<T>,
    lease: Option<Lease<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn attached(shared: Arc<FlowShared<T>>, id: u64, inbox: Inbox<T>) -> Self {
        Self {
            inbox,
            lease: Some(Lease { shared, id }),
        }
    }

    /// A subscription to an already closed flow: it yields nothing.
    pub(crate) fn finished() -> Self {
        Self {
            inbox: Inbox::finished(),
            lease: None,
        }
    }

    /// Waits for the next value; `None` once the flow has closed.
    ///
    /// Cancel-safe: dropping the future never loses a value.
    pub async fn recv(&mut self) -> Option<T> {
        let next = self.inbox.recv().await;
        if next.is_none() {
            self.lease = None;
        }
        next
    }

    /// Returns `true` once the closed marker is the next item.
    pub fn is_finished(&self) -> bool {
        self.inbox.is_finished()
    }

    /// Returns `true` while this subscription counts against the subscriber registry.
    pub fn is_attached(&self) -> bool {
        self.lease.is_some()
    }
}

impl<T> Subscription<T>
where
    T: Send + 'static,
{
    /// Turns the subscription into a stream that ends when the flow closes.
    pub fn into_stream(self) -> BoxStream<'static, T> {
        futures::stream::unfold(self, |mut sub| async move {
            let next = sub.recv().await?;
            Some((next, sub))
        })
        .boxed()
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .field("finished", &self.is_finished())
            .finish()
    }
}
