//! Error types used by paging flows and their upstreams.
//!
//! This module defines two error enums:
//!
//! - [`SubscribeError`]: raised synchronously by [`PagingFlow::subscribe`](crate::PagingFlow::subscribe).
//! - [`UpstreamError`]: yielded by an [`Upstream`](crate::Upstream) page source.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced when attaching a subscriber.
///
/// A rejected subscription leaves the flow untouched; callers must release an
/// active subscription before trying again.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeError {
    /// The configured subscriber cap is already reached by live subscriptions.
    #[error("subscriber limit exceeded: at most {limit} concurrent subscriber(s)")]
    SubscriberLimitExceeded {
        /// The configured maximum number of concurrent subscribers.
        limit: usize,
    },
}

impl SubscribeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use paging_flow::SubscribeError;
    ///
    /// let err = SubscribeError::SubscriberLimitExceeded { limit: 1 };
    /// assert_eq!(err.as_label(), "subscriber_limit_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscribeError::SubscriberLimitExceeded { .. } => "subscriber_limit_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubscribeError::SubscriberLimitExceeded { limit } => {
                format!("limit of {limit} subscriber(s) reached")
            }
        }
    }
}

/// # Errors produced by an upstream page source.
///
/// The flow never retries: the first error ends the activation and closes the
/// flow, exactly like a natural completion. Wrap the upstream yourself if you
/// need retries.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Loading a page failed.
    #[error("page load failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The source gave up because its own context was cancelled.
    #[error("upstream cancelled")]
    Canceled,
}

impl UpstreamError {
    /// Convenience constructor for [`UpstreamError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        UpstreamError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use paging_flow::UpstreamError;
    ///
    /// assert_eq!(UpstreamError::fail("boom").as_label(), "upstream_failed");
    /// assert_eq!(UpstreamError::Canceled.as_label(), "upstream_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UpstreamError::Fail { .. } => "upstream_failed",
            UpstreamError::Canceled => "upstream_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            UpstreamError::Fail { error } => format!("error: {error}"),
            UpstreamError::Canceled => "upstream cancelled".to_string(),
        }
    }
}
