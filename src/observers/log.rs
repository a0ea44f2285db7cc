//! # LogWriter: simple event printer
//!
//! A minimal observer that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [joined] flow="feed" subscribers=1
//! [upstream-started] flow="feed" activation=1
//! [left] flow="feed" subscribers=0
//! [upstream-stopped] flow="feed" activation=1
//! [closed] flow="feed" reason="no_subscribers"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SubscriberJoined => {
                println!("[joined] flow={:?} subscribers={:?}", e.flow, e.subscribers);
            }
            EventKind::SubscriberLeft => {
                println!("[left] flow={:?} subscribers={:?}", e.flow, e.subscribers);
            }
            EventKind::SubscriberRejected => {
                println!(
                    "[rejected] flow={:?} subscribers={:?} err={:?}",
                    e.flow, e.subscribers, e.reason
                );
            }
            EventKind::UpstreamStarted => {
                println!("[upstream-started] flow={:?} activation={:?}", e.flow, e.activation);
            }
            EventKind::UpstreamStopped => {
                println!("[upstream-stopped] flow={:?} activation={:?}", e.flow, e.activation);
            }
            EventKind::UpstreamCompleted => {
                println!("[upstream-completed] flow={:?} activation={:?}", e.flow, e.activation);
            }
            EventKind::UpstreamFailed => {
                println!(
                    "[upstream-failed] flow={:?} activation={:?} err={:?}",
                    e.flow, e.activation, e.reason
                );
            }
            EventKind::CancelRequested => {
                println!("[cancel-requested] flow={:?}", e.flow);
            }
            EventKind::FlowClosed => {
                println!("[closed] flow={:?} reason={:?}", e.flow, e.reason);
            }
            EventKind::CoordinatorDead => {
                println!("[coordinator-dead] flow={:?} reason={:?}", e.flow, e.reason);
            }
            EventKind::ObserverOverflow => {
                println!(
                    "[observer-overflow] flow={:?} observer={:?} reason={:?}",
                    e.flow, e.observer, e.reason
                );
            }
            EventKind::ObserverPanicked => {
                println!(
                    "[observer-panicked] flow={:?} observer={:?} panic={:?}",
                    e.flow, e.observer, e.reason
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
