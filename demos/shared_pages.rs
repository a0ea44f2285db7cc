//! # Shared Pages Example
//!
//! One slow paginated upstream shared by several readers.
//!
//! Demonstrates:
//! - Lazy activation (nothing is loaded until the first reader subscribes)
//! - Replay of the latest page to a late reader
//! - The subscriber cap (`max_subscribers = 2`)
//! - Explicit `cancel()` that waits for the upstream to stop
//!
//! ## Run
//! ```bash
//! cargo run --example shared_pages --features logging
//! ```

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use paging_flow::{
    LogWriter, Observe, PagingConfig, PagingFlow, UpstreamError, UpstreamFn, UpstreamRef,
};

/// Loads `page_size` items per page, one page every 200ms, forever.
fn catalog(page_size: u32) -> UpstreamRef<Vec<u32>> {
    UpstreamFn::arc("catalog", move || {
        futures::stream::unfold(0u32, move |page| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let start = page * page_size;
            let items: Vec<u32> = (start..start + page_size).collect();
            Some((Ok::<_, UpstreamError>(items), page + 1))
        })
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = PagingConfig {
        max_subscribers: 2,
        ..PagingConfig::default()
    };
    let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter::new())];
    let flow = PagingFlow::builder(catalog(3))
        .with_config(cfg)
        .with_observers(observers)
        .build();

    println!("state before subscribing: {:?}", flow.state());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let reader = flow.subscribe()?;
    let first_pages: Vec<Vec<u32>> = reader.into_stream().take(3).collect().await;
    println!("reader saw {first_pages:?}");

    let mut late = flow.subscribe()?;
    if let Some(page) = late.recv().await {
        println!("late reader starts from the latest page {page:?}");
    }

    let _second = flow.subscribe()?;
    match flow.subscribe() {
        Ok(_) => println!("unexpected: third reader admitted"),
        Err(e) => println!("third reader rejected: {e}"),
    }

    flow.cancel().await;
    println!("after cancel: state={:?} late.recv()={:?}", flow.state(), late.recv().await);

    // Let the observer worker print the last events.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
