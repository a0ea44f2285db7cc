//! # Run a single activation of the upstream.
//!
//! Opens the [`Upstream`] once and forwards every value into the flow's channel
//! until the stream ends, yields an error, or the activation token is cancelled.
//!
//! ## Event flow
//!
//! ```text
//! Start:
//!   upstream.open() → publish UpstreamStarted
//!
//! Completion:
//!   stream → None → publish UpstreamCompleted → Completed
//!
//! Failure:
//!   stream → Err(Fail) → publish UpstreamFailed → Failed(err)
//!   stream → Err(Canceled) → publish UpstreamCompleted → Completed
//!
//! Stop:
//!   token cancelled → drop stream → Stopped (the coordinator reports it)
//! ```
//!
//! ## Rules
//! - Forward-only: values go straight to the channel, nothing is buffered here
//! - The stream is dropped before the activation returns, so once its task is
//!   joined the upstream can no longer be polled
//! - Errors are reported, never retried

use tokio_util::sync::CancellationToken;

use futures::StreamExt;

use crate::{
    core::flow::FlowShared,
    error::UpstreamError,
    events::{Event, EventKind},
    upstream::Upstream,
};

/// How an activation ended.
#[derive(Debug)]
pub(crate) enum ActivationExit {
    /// The upstream finished (or gave up with [`UpstreamError::Canceled`]).
    Completed,
    /// The upstream yielded an error.
    Failed(UpstreamError),
    /// The activation token was cancelled.
    Stopped,
}

/// Reads one pass of `upstream` into the shared channel.
pub(crate) async fn run_activation<T, U>(
    shared: &FlowShared<T>,
    upstream: &U,
    token: CancellationToken,
    activation: u32,
) -> ActivationExit
where
    T: Clone + Send + Sync + 'static,
    U: Upstream<T> + ?Sized,
{
    let mut stream = upstream.open();
    shared.publish(Event::new(EventKind::UpstreamStarted).with_activation(activation));

    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => return ActivationExit::Stopped,
            item = stream.next() => item,
        };

        match item {
            Some(Ok(value)) => {
                if !shared.channel.publish(value) {
                    return ActivationExit::Stopped;
                }
            }
            Some(Err(UpstreamError::Canceled)) | None => {
                shared.publish(
                    Event::new(EventKind::UpstreamCompleted).with_activation(activation),
                );
                return ActivationExit::Completed;
            }
            Some(Err(e)) => {
                shared.publish(
                    Event::new(EventKind::UpstreamFailed)
                        .with_activation(activation)
                        .with_reason(e.to_string()),
                );
                return ActivationExit::Failed(e);
            }
        }
    }
}
