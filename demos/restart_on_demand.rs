//! # Restart On Demand Example
//!
//! Stops the upstream when the last reader leaves and reopens it for the next one.
//!
//! A custom observer counts activations:
//! - Upstream starts
//! - Upstream stops (zero subscribers)
//! - Flow closures
//!
//! ## Run
//! ```bash
//! cargo run --example restart_on_demand
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use paging_flow::{
    Event, EventKind, FlowState, Observe, PagingConfig, PagingFlow, UpstreamError, UpstreamFn,
    UpstreamRef,
};

struct ActivationMetrics {
    starts: AtomicU64,
    stops: AtomicU64,
    closes: AtomicU64,
}

impl ActivationMetrics {
    fn new() -> Self {
        Self {
            starts: AtomicU64::new(0),
            stops: AtomicU64::new(0),
            closes: AtomicU64::new(0),
        }
    }

    fn print_stats(&self) {
        println!();
        println!("Metrics:");
        println!(" ├─► Upstream starts: {}", self.starts.load(Ordering::Relaxed));
        println!(" ├─► Upstream stops:  {}", self.stops.load(Ordering::Relaxed));
        println!(" └─► Flow closures:   {}", self.closes.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Observe for ActivationMetrics {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::UpstreamStarted => {
                self.starts.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::UpstreamStopped => {
                self.stops.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::FlowClosed => {
                self.closes.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "activation-metrics"
    }

    fn accepts(&self, kind: EventKind) -> bool {
        matches!(
            kind,
            EventKind::UpstreamStarted | EventKind::UpstreamStopped | EventKind::FlowClosed
        )
    }
}

/// Emits an increasing page number every 100ms.
fn ticker() -> UpstreamRef<u64> {
    UpstreamFn::arc("ticker", || {
        futures::stream::unfold(1u64, |page| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Some((Ok::<_, UpstreamError>(page), page + 1))
        })
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let metrics = Arc::new(ActivationMetrics::new());
    let cfg = PagingConfig {
        stop_on_zero_subscribers: true,
        allow_restart_after_stop: true,
        ..PagingConfig::default()
    };
    let flow = PagingFlow::builder(ticker())
        .with_config(cfg)
        .with_observers(vec![metrics.clone()])
        .build();

    for round in 1..=2 {
        let mut sub = flow.subscribe()?;
        for _ in 0..3 {
            if let Some(page) = sub.recv().await {
                println!("round {round}: page {page}");
            }
        }
        drop(sub);

        let mut state = flow.watch_state();
        state.wait_for(|s| *s == FlowState::Idle).await?;
        println!("round {round}: no readers left, upstream stopped");
        // The next round starts from page 1 again: an idle flow replays nothing.
    }

    flow.cancel().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    metrics.print_stats();
    Ok(())
}
