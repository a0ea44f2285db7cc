//! # Coordinator: lifecycle of one paging flow.
//!
//! Watches the subscriber count and starts or stops activations of the
//! upstream accordingly. When the flow ends for any reason, the coordinator
//! emits the closed marker exactly once and signals that it has fully stopped.
//!
//! ## State machine
//! ```text
//!            count > 0                      count == 0 && stop_on_zero
//!   Idle ────────────────► Active ─────────────────────────────┐
//!    ▲                      │  │                               │
//!    │   restart allowed    │  │ upstream completes / fails    ▼
//!    └──────────────────────┼──┼───────────────────────── stop activation
//!                           │  ▼                               │ restart forbidden
//!          cancel / scope ──┴► Closed ◄────────────────────────┘
//! ```
//!
//! ## Architecture
//! ```text
//! PagingFlowBuilder::build() ──► tokio::spawn(Coordinator::run(token))
//!
//! loop {
//!   ├─► token cancelled?                    → Cancelled
//!   ├─► count > 0 && idle                   → activation += 1, spawn run_activation (child token)
//!   ├─► count == 0 && stop_on_zero && active → cancel + join activation, publish UpstreamStopped
//!   │       ├─ restart allowed   → forget latest value, Idle, continue
//!   │       └─ otherwise         → NoSubscribers
//!   └─► select! (biased)
//!         ├─ token.cancelled()     → Cancelled
//!         ├─ activation joined     → Completed / Failed / Panicked
//!         └─ count changed         → re-evaluate
//! }
//! teardown (Drop): close channel + state Closed + FlowClosed, cancel token, signal stopped
//! ```
//!
//! ## Rules
//! - At most **one** activation runs at a time; it is always joined before the next starts
//! - Going back to `Idle` forgets the latest value: a restarted flow never replays a
//!   value produced by a previous activation to a new subscriber
//! - The activation runs under a **child token**, so cancelling the flow reaches it directly
//! - Teardown is synchronous and lives in a `Drop` guard: it still runs if the
//!   coordinator future is dropped or panics

use std::sync::Arc;

use tokio::{
    select,
    task::{JoinError, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        consumer::{ActivationExit, run_activation},
        flow::{FlowShared, FlowState},
    },
    events::{Event, EventKind},
    upstream::UpstreamRef,
};

/// Why a flow closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseReason {
    Completed,
    Failed,
    Panicked,
    Cancelled,
    NoSubscribers,
    Dropped,
}

impl CloseReason {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            CloseReason::Completed => "upstream_completed",
            CloseReason::Failed => "upstream_failed",
            CloseReason::Panicked => "upstream_panicked",
            CloseReason::Cancelled => "cancelled",
            CloseReason::NoSubscribers => "no_subscribers",
            CloseReason::Dropped => "coordinator_dropped",
        }
    }
}

/// Maps a joined activation to the reason it ends the flow, if any.
///
/// `Ok(Stopped)` is the only outcome that leaves the flow open.
fn close_reason(res: &Result<ActivationExit, JoinError>) -> Option<CloseReason> {
    match res {
        Ok(ActivationExit::Stopped) => None,
        Ok(ActivationExit::Completed) => Some(CloseReason::Completed),
        Ok(ActivationExit::Failed(_)) => Some(CloseReason::Failed),
        Err(_) => Some(CloseReason::Panicked),
    }
}

struct Activation {
    n: u32,
    token: CancellationToken,
    join: JoinHandle<ActivationExit>,
}

enum Step {
    Cancelled,
    Exited(Result<ActivationExit, JoinError>),
    CountChanged,
}

/// Closes the flow when the coordinator goes away, whatever the path.
struct Teardown<T> {
    shared: Arc<FlowShared<T>>,
    token: CancellationToken,
    stopped: CancellationToken,
    reason: CloseReason,
}

impl<T> Drop for Teardown<T> {
    fn drop(&mut self) {
        self.token.cancel();
        if self.shared.close(self.reason.as_label()) {
            tracing::debug!(
                flow = %self.shared.name,
                reason = self.reason.as_label(),
                "paging flow closed"
            );
        }
        self.stopped.cancel();
    }
}

/// Drives activations of one upstream for one flow.
pub(crate) struct Coordinator<T> {
    shared: Arc<FlowShared<T>>,
    upstream: UpstreamRef<T>,
    stopped: CancellationToken,
}

impl<T> Coordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        shared: Arc<FlowShared<T>>,
        upstream: UpstreamRef<T>,
        stopped: CancellationToken,
    ) -> Self {
        Self {
            shared,
            upstream,
            stopped,
        }
    }

    /// Runs until the flow closes; `stopped` is cancelled on the way out.
    pub(crate) async fn run(self, token: CancellationToken) {
        let mut teardown = Teardown {
            shared: Arc::clone(&self.shared),
            token: token.clone(),
            stopped: self.stopped.clone(),
            reason: CloseReason::Dropped,
        };
        teardown.reason = self.drive(&token).await;
    }

    async fn drive(&self, token: &CancellationToken) -> CloseReason {
        let mut count_rx = self.shared.registry.watch();
        let mut active: Option<Activation> = None;
        let mut activations: u32 = 0;

        let reason = loop {
            if token.is_cancelled() {
                break CloseReason::Cancelled;
            }

            let count = *count_rx.borrow_and_update();
            if count > 0 && active.is_none() {
                activations += 1;
                active = Some(self.start(token, activations));
                self.shared.set_state(FlowState::Active);
            } else if count == 0 && self.shared.cfg.stop_on_zero_subscribers {
                if let Some(act) = active.take() {
                    let res = self.stop(act).await;
                    if let Some(reason) = close_reason(&res) {
                        break reason;
                    }
                    if !self.shared.cfg.restart_allowed() {
                        break CloseReason::NoSubscribers;
                    }
                    self.shared.channel.reset_latest();
                    self.shared.set_state(FlowState::Idle);
                    continue;
                }
            }

            let step = select! {
                biased;
                _ = token.cancelled() => Step::Cancelled,
                res = join_active(&mut active) => Step::Exited(res),
                changed = count_rx.changed() => match changed {
                    Ok(()) => Step::CountChanged,
                    Err(_) => Step::Cancelled,
                },
            };

            match step {
                Step::Cancelled => break CloseReason::Cancelled,
                Step::CountChanged => {}
                Step::Exited(res) => {
                    active = None;
                    match &res {
                        Ok(ActivationExit::Failed(e)) => {
                            tracing::debug!(flow = %self.shared.name, error = %e, "upstream failed");
                        }
                        Err(e) => {
                            tracing::warn!(flow = %self.shared.name, error = %e, "upstream activation panicked");
                        }
                        Ok(_) => {}
                    }
                    // Stopped without our cancel: the channel was closed under it.
                    break close_reason(&res).unwrap_or(CloseReason::Cancelled);
                }
            }
        };

        if let Some(act) = active.take() {
            let _ = self.stop(act).await;
        }
        reason
    }

    fn start(&self, token: &CancellationToken, n: u32) -> Activation {
        let child = token.child_token();
        let shared = Arc::clone(&self.shared);
        let upstream = Arc::clone(&self.upstream);
        let run_token = child.clone();
        let join = tokio::spawn(async move {
            run_activation(&shared, upstream.as_ref(), run_token, n).await
        });
        Activation {
            n,
            token: child,
            join,
        }
    }

    /// Cancels an activation and waits until its upstream has been dropped.
    async fn stop(&self, act: Activation) -> Result<ActivationExit, JoinError> {
        act.token.cancel();
        let res = act.join.await;
        match &res {
            Ok(ActivationExit::Stopped) => {
                self.shared
                    .publish(Event::new(EventKind::UpstreamStopped).with_activation(act.n));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(flow = %self.shared.name, error = %e, "upstream activation panicked");
            }
        }
        res
    }
}

async fn join_active(active: &mut Option<Activation>) -> Result<ActivationExit, JoinError> {
    match active {
        Some(act) => (&mut act.join).await,
        None => std::future::pending().await,
    }
}
