//! # Subscriber registry - live subscriber count as a watchable value.
//!
//! The registry is the single source of truth for "how many subscribers are
//! observing the flow right now". It is backed by a [`tokio::sync::watch`]
//! channel so the coordinator can react to every count transition.
//!
//! ## Rules
//! - `try_acquire` checks the cap against the **live** count and increments in
//!   one atomic step; two racing subscribers can never both take the last seat.
//! - `release` never blocks; it only decrements and notifies watchers.
//! - The registry enforces nothing by itself: the cap is supplied by the caller.
//! - Watchers observe the latest count; rapid transitions may be coalesced.

use tokio::sync::watch;

use crate::error::SubscribeError;

/// Live subscriber counter shared by a flow, its subscriptions and its coordinator.
#[derive(Debug)]
pub(crate) struct SubscriberRegistry {
    count: watch::Sender<usize>,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        let (count, _rx) = watch::channel(0);
        Self { count }
    }

    /// Registers one subscriber unless `limit` is already reached.
    ///
    /// Returns the count after the increment.
    pub(crate) fn try_acquire(&self, limit: Option<usize>) -> Result<usize, SubscribeError> {
        let mut outcome = Ok(0);
        self.count.send_if_modified(|n| match limit {
            Some(limit) if *n >= limit => {
                outcome = Err(SubscribeError::SubscriberLimitExceeded { limit });
                false
            }
            _ => {
                *n += 1;
                outcome = Ok(*n);
                true
            }
        });
        outcome
    }

    /// Unregisters one subscriber; returns the count after the decrement.
    pub(crate) fn release(&self) -> usize {
        let mut after = 0;
        self.count.send_modify(|n| {
            *n = n.saturating_sub(1);
            after = *n;
        });
        after
    }

    pub(crate) fn count(&self) -> usize {
        *self.count.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}
