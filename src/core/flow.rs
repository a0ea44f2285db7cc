//! # PagingFlow: the public handle of a shared, cancelable paging stream.
//!
//! The [`PagingFlow`] owns the shared state of one flow (channel, subscriber
//! registry, state cell, event bus) and the join handle of its coordinator.
//! It hands out [`Subscription`]s and exposes the explicit cancel operation.
//!
//! ## High-level architecture
//! ```text
//! Inputs to build():
//!   UpstreamRef<T> + PagingConfig + scope token ──► PagingFlowBuilder::build()
//!
//! Shared state (Arc<FlowShared<T>>):
//!   - Channel<T>          replay-of-latest broadcast + closed marker
//!   - SubscriberRegistry  live subscriber count (watch)
//!   - state               Idle / Active / Closed (watch, written by the coordinator only)
//!   - Bus                 lifecycle events ──► ObserverSet
//!
//! subscribe():
//!   closed?            ──► Ok(finished subscription, zero values)
//!   cap reached?       ──► Err(SubscriberLimitExceeded)
//!   otherwise          ──► registry += 1, channel.attach() ──► Subscription
//!
//! cancel():
//!   token.cancel() ──► coordinator stops the activation, emits the closed marker
//!                 ──► await coordinator exit
//! ```
//!
//! ## Example
//! ```rust
//! use futures::{StreamExt, stream};
//! use paging_flow::{PagingConfig, PagingFlow, UpstreamError, UpstreamFn, UpstreamRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let pages: UpstreamRef<Vec<u32>> = UpstreamFn::arc("pages", || {
//!         stream::iter(vec![Ok::<_, UpstreamError>(vec![1, 2, 3]), Ok(vec![4, 5])])
//!     });
//!     let flow = PagingFlow::new(pages, PagingConfig::default());
//!
//!     let sub = flow.subscribe().expect("no cap configured");
//!     let seen: Vec<Vec<u32>> = sub.into_stream().collect().await;
//!
//!     assert_eq!(seen.last(), Some(&vec![4, 5]));
//!     assert!(flow.is_closed());
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        PagingConfig, builder::PagingFlowBuilder, channel::Channel, registry::SubscriberRegistry,
        subscription::Subscription,
    },
    error::SubscribeError,
    events::{Bus, Event, EventKind},
    upstream::UpstreamRef,
};

/// Lifecycle state of a flow.
///
/// `Idle → Active → (Idle | Closed)`; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Upstream is not being consumed (no subscriber yet, or stopped with restart allowed).
    Idle,
    /// A consumption task is reading the upstream and forwarding values.
    Active,
    /// Terminal: no value is ever forwarded again.
    Closed,
}

/// State shared by the flow handle, its subscriptions and its coordinator.
pub(crate) struct FlowShared<T> {
    pub(crate) name: Arc<str>,
    pub(crate) cfg: PagingConfig,
    pub(crate) bus: Bus,
    pub(crate) channel: Channel<T>,
    pub(crate) registry: SubscriberRegistry,
    state: watch::Sender<FlowState>,
}

impl<T> FlowShared<T> {
    pub(crate) fn new(name: impl Into<Arc<str>>, cfg: PagingConfig) -> Self {
        let name: Arc<str> = name.into();
        let (state, _rx) = watch::channel(FlowState::Idle);
        Self {
            bus: Bus::new(Arc::clone(&name), cfg.bus_capacity_clamped()),
            name,
            channel: Channel::new(cfg.delivery()),
            registry: SubscriberRegistry::new(),
            cfg,
            state,
        }
    }

    /// Publishes an event tagged with the live subscriber count.
    pub(crate) fn publish(&self, mut ev: Event) {
        if ev.subscribers.is_none() {
            ev = ev.with_subscribers(self.registry.count());
        }
        self.bus.publish(ev);
    }

    pub(crate) fn state(&self) -> FlowState {
        *self.state.borrow()
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    /// Moves to `next` unless the flow is already closed.
    pub(crate) fn set_state(&self, next: FlowState) -> bool {
        self.state.send_if_modified(|s| {
            if *s == FlowState::Closed || *s == next {
                return false;
            }
            *s = next;
            true
        })
    }

    /// Emits the closed marker exactly once; later calls are no-ops.
    ///
    /// Synchronous on purpose: it runs in teardown paths that must not be interrupted.
    pub(crate) fn close(&self, reason: &'static str) -> bool {
        if !self.channel.close() {
            return false;
        }
        self.set_state(FlowState::Closed);
        self.publish(Event::new(EventKind::FlowClosed).with_reason(reason));
        true
    }
}

/// Shared, cancelable, multi-subscriber paging stream.
///
/// Created with [`PagingFlow::new`] or [`PagingFlow::builder`] inside a Tokio runtime.
/// Dropping the handle cancels the flow, like tearing down its owning scope;
/// subscriptions still alive then observe completion.
pub struct PagingFlow<T> {
    shared: Arc<FlowShared<T>>,
    token: CancellationToken,
    stopped: CancellationToken,
    coordinator: Mutex<Option<JoinHandle<()>>>,
}

impl<T> PagingFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts building a flow over `upstream`.
    pub fn builder(upstream: UpstreamRef<T>) -> PagingFlowBuilder<T> {
        PagingFlowBuilder::new(upstream)
    }

    /// Creates a flow with `cfg`, no parent scope and no observers.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(upstream: UpstreamRef<T>, cfg: PagingConfig) -> Self {
        Self::builder(upstream).with_config(cfg).build()
    }

    pub(crate) fn from_parts(
        shared: Arc<FlowShared<T>>,
        token: CancellationToken,
        stopped: CancellationToken,
        coordinator: JoinHandle<()>,
    ) -> Self {
        Self {
            shared,
            token,
            stopped,
            coordinator: Mutex::new(Some(coordinator)),
        }
    }

    /// Registers a new subscriber.
    ///
    /// ### Outcomes
    /// - flow already closed → `Ok` subscription that yields no values;
    /// - cap configured and reached by live subscriptions → [`SubscribeError::SubscriberLimitExceeded`];
    /// - otherwise → a subscription that first replays the latest value (if any),
    ///   then every later value, and finishes when the flow closes.
    ///
    /// The first subscriber activates the upstream.
    pub fn subscribe(&self) -> Result<Subscription<T>, SubscribeError> {
        if self.shared.channel.is_closed() {
            return Ok(Subscription::finished());
        }

        let count = match self.shared.registry.try_acquire(self.shared.cfg.subscriber_limit()) {
            Ok(count) => count,
            Err(e) => {
                self.shared
                    .publish(Event::new(EventKind::SubscriberRejected).with_reason(e.as_label()));
                return Err(e);
            }
        };

        let (id, inbox) = self.shared.channel.attach();
        self.shared
            .publish(Event::new(EventKind::SubscriberJoined).with_subscribers(count));
        Ok(Subscription::attached(Arc::clone(&self.shared), id, inbox))
    }

    /// Cancels the flow and waits until its coordinator has fully stopped.
    ///
    /// After this returns the upstream is no longer consumed, every subscription
    /// has received the closed marker and later subscriptions finish immediately.
    /// Calling it again (or after the flow closed on its own) is a no-op wait.
    pub async fn cancel(&self) {
        if !self.token.is_cancelled() && !self.is_closed() {
            self.shared.publish(Event::new(EventKind::CancelRequested));
        }
        self.token.cancel();

        let coordinator = self
            .coordinator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(join) = coordinator {
            if let Err(e) = join.await {
                if e.is_panic() {
                    tracing::error!(flow = %self.shared.name, "paging flow coordinator panicked");
                    self.shared.publish(
                        Event::new(EventKind::CoordinatorDead).with_reason("coordinator_panic"),
                    );
                }
            }
        }
        self.stopped.cancelled().await;
    }
}

impl<T> PagingFlow<T> {
    /// Name of the flow (the upstream's name).
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configuration the flow was built with.
    pub fn config(&self) -> &PagingConfig {
        &self.shared.cfg
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FlowState {
        self.shared.state()
    }

    /// Watches lifecycle state transitions.
    pub fn watch_state(&self) -> watch::Receiver<FlowState> {
        self.shared.watch_state()
    }

    /// Returns `true` once the closed marker has been emitted.
    pub fn is_closed(&self) -> bool {
        self.shared.channel.is_closed()
    }

    /// Waits until the flow is closed, for whatever reason.
    pub async fn closed(&self) {
        let mut rx = self.shared.watch_state();
        let _ = rx.wait_for(|s| *s == FlowState::Closed).await;
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.count()
    }

    /// Watches the live subscription count.
    pub fn watch_subscriber_count(&self) -> watch::Receiver<usize> {
        self.shared.registry.watch()
    }
}

impl<T> Drop for PagingFlow<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<T> std::fmt::Debug for PagingFlow<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagingFlow")
            .field("name", &self.shared.name)
            .field("state", &self.shared.state())
            .field("subscribers", &self.shared.registry.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::{StreamExt, stream};
    use tokio_util::sync::CancellationToken;

    use crate::{
        Event, EventKind, FlowState, Observe, PagingConfig, PagingFlow, SubscribeError, UpstreamError,
        UpstreamFn, UpstreamRef,
    };

    /// Upstream that counts opens, yields `values` and then stays open.
    fn open_ended(opens: &Arc<AtomicUsize>, values: Vec<u32>) -> UpstreamRef<u32> {
        let opens = Arc::clone(opens);
        UpstreamFn::arc("open-ended", move || {
            opens.fetch_add(1, Ordering::SeqCst);
            let pages: Vec<Result<u32, UpstreamError>> = values.iter().copied().map(Ok).collect();
            stream::iter(pages).chain(stream::pending())
        })
    }

    /// Upstream that counts opens, yields `items` and completes.
    fn finite(opens: &Arc<AtomicUsize>, items: Vec<Result<u32, UpstreamError>>) -> UpstreamRef<u32> {
        let opens = Arc::clone(opens);
        UpstreamFn::arc("finite", move || {
            opens.fetch_add(1, Ordering::SeqCst);
            stream::iter(items.clone())
        })
    }

    /// Upstream that yields `values` spaced by `gap` and completes.
    fn spaced(opens: &Arc<AtomicUsize>, values: Vec<u32>, gap: Duration) -> UpstreamRef<u32> {
        let opens = Arc::clone(opens);
        UpstreamFn::arc("spaced", move || {
            opens.fetch_add(1, Ordering::SeqCst);
            stream::iter(values.clone()).then(move |v| async move {
                tokio::time::sleep(gap).await;
                Ok::<u32, UpstreamError>(v)
            })
        })
    }

    /// Lets every spawned task run until the runtime is idle.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    async fn wait_state(flow: &PagingFlow<u32>, want: FlowState) {
        let mut rx = flow.watch_state();
        rx.wait_for(|s| *s == want).await.expect("state sender alive");
    }

    fn stop_on_zero(restart: bool) -> PagingConfig {
        PagingConfig {
            stop_on_zero_subscribers: true,
            allow_restart_after_stop: restart,
            ..PagingConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_untouched_until_first_subscriber() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), PagingConfig::default());

        settle().await;
        assert_eq!(opens.load(Ordering::SeqCst), 0);
        assert_eq!(flow.state(), FlowState::Idle);

        let mut sub = flow.subscribe().expect("subscribe");
        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(flow.state(), FlowState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_cap_counts_live_subscriptions() {
        let opens = Arc::new(AtomicUsize::new(0));
        let cfg = PagingConfig {
            max_subscribers: 1,
            ..PagingConfig::default()
        };
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), cfg);

        let first = flow.subscribe().expect("first seat");
        let err = flow.subscribe().expect_err("cap reached");
        assert_eq!(err, SubscribeError::SubscriberLimitExceeded { limit: 1 });
        assert_eq!(flow.subscriber_count(), 1);

        drop(first);
        assert_eq!(flow.subscriber_count(), 0);
        let _third = flow.subscribe().expect("seat released on drop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_cap_rejects_everyone() {
        let opens = Arc::new(AtomicUsize::new(0));
        let cfg = PagingConfig {
            max_subscribers: 0,
            ..PagingConfig::default()
        };
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), cfg);

        assert!(flow.subscribe().is_err());
        settle().await;
        assert_eq!(opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_subscribe_is_idempotent() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1, 2]), PagingConfig::default());

        flow.cancel().await;
        flow.cancel().await;
        assert!(flow.is_closed());
        assert_eq!(flow.state(), FlowState::Closed);

        let sub = flow.subscribe().expect("closed flow still hands out subscriptions");
        assert!(sub.is_finished());
        assert!(!sub.is_attached());
        let seen: Vec<u32> = sub.into_stream().collect().await;
        assert!(seen.is_empty());
        assert_eq!(opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_ends_live_subscriptions_and_drops_upstream() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dropped);
        let upstream: UpstreamRef<u32> = UpstreamFn::arc("guarded", move || {
            let guard = DropFlag(Arc::clone(&flag));
            stream::iter(vec![Ok::<u32, UpstreamError>(1)])
                .chain(stream::pending())
                .map(move |item| guard.pass(item))
        });
        let flow = PagingFlow::new(upstream, PagingConfig::default());

        let mut sub = flow.subscribe().expect("subscribe");
        assert_eq!(sub.recv().await, Some(1));

        flow.cancel().await;
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(sub.recv().await, None);
        assert!(!sub.is_attached());
        assert_eq!(flow.subscriber_count(), 0);
    }

    struct DropFlag(Arc<AtomicBool>);

    impl DropFlag {
        fn pass<I>(&self, item: I) -> I {
            item
        }
    }

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_zero_without_restart_closes_for_good() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), stop_on_zero(false));

        let mut s1 = flow.subscribe().expect("s1");
        let mut s2 = flow.subscribe().expect("s2");
        assert_eq!(s1.recv().await, Some(1));
        assert_eq!(s2.recv().await, Some(1));

        drop(s1);
        drop(s2);
        flow.closed().await;
        assert_eq!(flow.state(), FlowState::Closed);

        let s3 = flow.subscribe().expect("s3");
        let seen: Vec<u32> = s3.into_stream().collect().await;
        assert!(seen.is_empty());
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_zero_with_restart_reopens_upstream() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), stop_on_zero(true));

        let mut s1 = flow.subscribe().expect("s1");
        assert_eq!(s1.recv().await, Some(1));
        drop(s1);
        wait_state(&flow, FlowState::Idle).await;
        assert!(!flow.is_closed());

        let mut s2 = flow.subscribe().expect("s2");
        assert_eq!(s2.recv().await, Some(1));
        wait_state(&flow, FlowState::Active).await;
        settle().await;
        assert_eq!(opens.load(Ordering::SeqCst), 2);

        flow.cancel().await;
        assert_eq!(s2.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_subscribers_keeps_running_by_default() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), PagingConfig::default());

        let mut s1 = flow.subscribe().expect("s1");
        assert_eq!(s1.recv().await, Some(1));
        drop(s1);
        settle().await;

        assert_eq!(flow.state(), FlowState::Active);
        let mut s2 = flow.subscribe().expect("s2");
        assert_eq!(s2.recv().await, Some(1));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_completion_reaches_every_subscriber() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(
            spaced(&opens, vec![1], Duration::from_millis(100)),
            PagingConfig::default(),
        );

        let s1 = flow.subscribe().expect("s1");
        let s2 = flow.subscribe().expect("s2");
        let (a, b) = tokio::join!(
            s1.into_stream().collect::<Vec<_>>(),
            s2.into_stream().collect::<Vec<_>>()
        );

        assert_eq!(a, vec![1]);
        assert_eq!(b, vec![1]);
        flow.closed().await;
        assert_eq!(flow.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_values_replay_latest_to_each_subscriber() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(
            spaced(&opens, vec![1, 2], Duration::from_millis(100)),
            PagingConfig::default(),
        );

        let s1 = flow.subscribe().expect("s1");
        let s2 = flow.subscribe().expect("s2");
        let (a, b) = tokio::join!(
            s1.into_stream().collect::<Vec<_>>(),
            s2.into_stream().collect::<Vec<_>>()
        );

        for seen in [a, b] {
            assert_eq!(seen.last(), Some(&2));
            assert!(seen.iter().all(|v| [1, 2].contains(v)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_subscriber_starts_from_latest_value() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1, 2, 3]), PagingConfig::default());

        let mut early = flow.subscribe().expect("early");
        while let Some(v) = early.recv().await {
            if v == 3 {
                break;
            }
        }

        let mut late = flow.subscribe().expect("late");
        assert_eq!(late.recv().await, Some(3));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_modes() {
        let items: Vec<Result<u32, UpstreamError>> = (1..=5).map(Ok).collect();

        let opens = Arc::new(AtomicUsize::new(0));
        let latest = PagingFlow::new(finite(&opens, items.clone()), PagingConfig::default());
        let sub = latest.subscribe().expect("latest");
        let seen: Vec<u32> = sub.into_stream().collect().await;
        assert_eq!(seen, vec![5]);

        let cfg = PagingConfig {
            unlimited_buffering: true,
            ..PagingConfig::default()
        };
        let unbounded = PagingFlow::new(finite(&opens, items), cfg);
        let sub = unbounded.subscribe().expect("unbounded");
        let seen: Vec<u32> = sub.into_stream().collect().await;
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_closes_flow() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(
            finite(&opens, vec![Ok(1), Err(UpstreamError::fail("page 2"))]),
            stop_on_zero(true),
        );

        let sub = flow.subscribe().expect("subscribe");
        let seen: Vec<u32> = sub.into_stream().collect().await;
        assert_eq!(seen, vec![1]);
        flow.closed().await;

        let again = flow.subscribe().expect("subscribe after failure");
        assert!(again.is_finished());
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_canceled_item_completes_normally() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(
            finite(&opens, vec![Ok(7), Err(UpstreamError::Canceled), Ok(8)]),
            PagingConfig::default(),
        );

        let sub = flow.subscribe().expect("subscribe");
        let seen: Vec<u32> = sub.into_stream().collect().await;
        assert_eq!(seen, vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_cancellation_closes_flow_but_not_the_reverse() {
        let opens = Arc::new(AtomicUsize::new(0));
        let scope = CancellationToken::new();

        let flow = PagingFlow::builder(open_ended(&opens, vec![1]))
            .with_scope(&scope)
            .build();
        let mut sub = flow.subscribe().expect("subscribe");
        assert_eq!(sub.recv().await, Some(1));

        scope.cancel();
        assert_eq!(sub.recv().await, None);
        flow.closed().await;

        let other_scope = CancellationToken::new();
        let other = PagingFlow::builder(open_ended(&opens, vec![1]))
            .with_scope(&other_scope)
            .build();
        other.cancel().await;
        assert!(!other_scope.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_flow_handle_ends_subscriptions() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), PagingConfig::default());

        let mut sub = flow.subscribe().expect("subscribe");
        assert_eq!(sub.recv().await, Some(1));

        drop(flow);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_count_watch() {
        let opens = Arc::new(AtomicUsize::new(0));
        let flow = PagingFlow::new(open_ended(&opens, vec![1]), PagingConfig::default());
        let mut rx = flow.watch_subscriber_count();

        let sub = flow.subscribe().expect("subscribe");
        rx.changed().await.expect("registry alive");
        assert_eq!(*rx.borrow_and_update(), 1);

        drop(sub);
        rx.changed().await.expect("registry alive");
        assert_eq!(*rx.borrow_and_update(), 0);
    }

    struct Recorder {
        seen: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn kinds(&self) -> Vec<EventKind> {
            self.seen
                .lock()
                .expect("lock")
                .iter()
                .map(|e| e.kind)
                .collect()
        }
    }

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, event: &Event) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(event.clone());
            }
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers_receive_lifecycle_events() {
        let rec = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let opens = Arc::new(AtomicUsize::new(0));
        let cfg = PagingConfig {
            max_subscribers: 1,
            ..PagingConfig::default()
        };
        let flow = PagingFlow::builder(open_ended(&opens, vec![1]))
            .with_config(cfg)
            .with_observers(vec![rec.clone()])
            .build();

        let mut sub = flow.subscribe().expect("subscribe");
        assert!(flow.subscribe().is_err());
        assert_eq!(sub.recv().await, Some(1));
        flow.cancel().await;
        assert_eq!(sub.recv().await, None);
        settle().await;

        let kinds = rec.kinds();
        let pos = |k: EventKind| kinds.iter().position(|seen| *seen == k);
        for k in [
            EventKind::SubscriberJoined,
            EventKind::SubscriberRejected,
            EventKind::UpstreamStarted,
            EventKind::CancelRequested,
            EventKind::UpstreamStopped,
            EventKind::FlowClosed,
            EventKind::SubscriberLeft,
        ] {
            assert!(pos(k).is_some(), "missing {k:?} in {kinds:?}");
        }
        assert!(pos(EventKind::SubscriberJoined) < pos(EventKind::UpstreamStarted));
        assert!(pos(EventKind::UpstreamStopped) < pos(EventKind::FlowClosed));
        assert_eq!(kinds.iter().filter(|k| **k == EventKind::FlowClosed).count(), 1);

        let seen = rec.seen.lock().expect("lock");
        let closed = seen
            .iter()
            .find(|e| e.kind == EventKind::FlowClosed)
            .expect("closed event");
        assert_eq!(closed.reason.as_deref(), Some("cancelled"));
        assert_eq!(closed.flow.as_deref(), Some("open-ended"));
    }

    /// Upstream whose every activation yields `100 * <activation number>` and stays open.
    fn per_activation(opens: &Arc<AtomicUsize>) -> UpstreamRef<u32> {
        let opens = Arc::clone(opens);
        UpstreamFn::arc("per-activation", move || {
            let n = opens.fetch_add(1, Ordering::SeqCst) as u32 + 1;
            stream::iter(vec![Ok::<u32, UpstreamError>(100 * n)]).chain(stream::pending())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_untouched_until_first_subscriber_in_every_mode() {
        let configs = [
            stop_on_zero(false),
            stop_on_zero(true),
            PagingConfig {
                unlimited_buffering: true,
                ..PagingConfig::default()
            },
            PagingConfig {
                max_subscribers: 2,
                ..PagingConfig::default()
            },
        ];

        for cfg in configs {
            let opens = Arc::new(AtomicUsize::new(0));
            let flow = PagingFlow::new(open_ended(&opens, vec![1]), cfg.clone());

            settle().await;
            assert_eq!(opens.load(Ordering::SeqCst), 0, "{cfg:?}");
            assert_eq!(flow.state(), FlowState::Idle, "{cfg:?}");

            let mut sub = flow.subscribe().expect("subscribe");
            assert_eq!(sub.recv().await, Some(1), "{cfg:?}");
            assert_eq!(opens.load(Ordering::SeqCst), 1, "{cfg:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_never_replays_previous_activation_value() {
        for unlimited_buffering in [false, true] {
            let opens = Arc::new(AtomicUsize::new(0));
            let cfg = PagingConfig {
                unlimited_buffering,
                ..stop_on_zero(true)
            };
            let flow = PagingFlow::new(per_activation(&opens), cfg);

            let mut s1 = flow.subscribe().expect("s1");
            assert_eq!(s1.recv().await, Some(100));
            drop(s1);
            wait_state(&flow, FlowState::Idle).await;

            let mut s2 = flow.subscribe().expect("s2");
            assert_eq!(s2.recv().await, Some(200));
            assert_eq!(opens.load(Ordering::SeqCst), 2);

            let mut s3 = flow.subscribe().expect("s3");
            assert_eq!(s3.recv().await, Some(200));
            flow.cancel().await;
        }
    }

    struct Panicky;

    #[async_trait]
    impl Observe for Panicky {
        async fn on_event(&self, _event: &Event) {
            panic!("observer bug");
        }

        fn name(&self) -> &'static str {
            "panicky"
        }

        fn accepts(&self, kind: EventKind) -> bool {
            kind == EventKind::UpstreamStarted
        }
    }

    struct Sluggish;

    #[async_trait]
    impl Observe for Sluggish {
        async fn on_event(&self, _event: &Event) {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        fn name(&self) -> &'static str {
            "sluggish"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_failures_reach_other_observers() {
        let rec = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let opens = Arc::new(AtomicUsize::new(0));
        let observers: Vec<Arc<dyn Observe>> =
            vec![rec.clone(), Arc::new(Panicky), Arc::new(Sluggish)];
        let flow = PagingFlow::builder(open_ended(&opens, vec![1]))
            .with_observers(observers)
            .build();

        let mut sub = flow.subscribe().expect("subscribe");
        assert_eq!(sub.recv().await, Some(1));
        for _ in 0..8 {
            drop(flow.subscribe().expect("extra"));
        }
        settle().await;

        let seen = rec.seen.lock().expect("lock").clone();
        let panicked: Vec<_> = seen
            .iter()
            .filter(|e| e.kind == EventKind::ObserverPanicked)
            .collect();
        assert_eq!(panicked.len(), 1);
        assert_eq!(panicked[0].observer, Some("panicky"));
        assert_eq!(panicked[0].reason.as_deref(), Some("observer bug"));
        assert_eq!(panicked[0].flow.as_deref(), Some("open-ended"));

        let overflow = seen
            .iter()
            .find(|e| e.kind == EventKind::ObserverOverflow)
            .expect("sluggish observer overflowed");
        assert_eq!(overflow.observer, Some("sluggish"));
        assert_eq!(overflow.reason.as_deref(), Some("full"));
    }
}
