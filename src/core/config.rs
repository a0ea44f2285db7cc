//! # Paging flow configuration.
//!
//! Provides [`PagingConfig`], the settings of one [`PagingFlow`](crate::PagingFlow).
//!
//! ## Sentinel values
//! - `max_subscribers < 0` (see [`PagingConfig::UNLIMITED`]) → no subscriber cap
//! - `allow_restart_after_stop` is ignored unless `stop_on_zero_subscribers` is set

use crate::core::channel::Delivery;

/// Configuration of a paging flow.
///
/// ## Field semantics
/// - `max_subscribers`: cap on concurrent subscribers (`-1` = unlimited)
/// - `stop_on_zero_subscribers`: stop the upstream when the last subscriber leaves
/// - `allow_restart_after_stop`: reopen the upstream on a later subscriber
/// - `unlimited_buffering`: queue every value per subscriber instead of keeping the latest
/// - `bus_capacity`: lifecycle event bus ring buffer size (min 1; clamped)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct PagingConfig {
    /// Maximum number of concurrent subscribers.
    ///
    /// - negative (`-1`) = unlimited
    /// - `n >= 0` = `subscribe()` fails once `n` subscriptions are alive
    pub max_subscribers: isize,

    /// Stop consuming the upstream when the subscriber count drops to zero.
    ///
    /// When `false`, the upstream runs from the first subscriber until it
    /// completes or the flow is cancelled.
    pub stop_on_zero_subscribers: bool,

    /// Allow a new activation after a stop triggered by zero subscribers.
    ///
    /// When `false`, that stop closes the flow for good.
    pub allow_restart_after_stop: bool,

    /// Never drop pending values awaiting delivery.
    ///
    /// The default keeps only the latest pending value per subscriber.
    pub unlimited_buffering: bool,

    /// Capacity of the lifecycle event bus.
    pub bus_capacity: usize,
}

impl PagingConfig {
    /// Sentinel for an unlimited subscriber count.
    pub const UNLIMITED: isize = -1;

    /// Returns the subscriber cap as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent subscribers
    #[inline]
    pub fn subscriber_limit(&self) -> Option<usize> {
        usize::try_from(self.max_subscribers).ok()
    }

    /// Returns `true` if a zero-subscriber stop may be followed by a restart.
    #[inline]
    pub fn restart_allowed(&self) -> bool {
        self.stop_on_zero_subscribers && self.allow_restart_after_stop
    }

    /// Returns the per-subscriber delivery mode.
    #[inline]
    pub fn delivery(&self) -> Delivery {
        if self.unlimited_buffering {
            Delivery::Unbounded
        } else {
            Delivery::Latest
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PagingConfig {
    /// Default configuration:
    ///
    /// - `max_subscribers = -1` (unlimited)
    /// - `stop_on_zero_subscribers = false` (run until completion or cancel)
    /// - `allow_restart_after_stop = false`
    /// - `unlimited_buffering = false` (latest value only)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_subscribers: Self::UNLIMITED,
            stop_on_zero_subscribers: false,
            allow_restart_after_stop: false,
            unlimited_buffering: false,
            bus_capacity: 1024,
        }
    }
}
