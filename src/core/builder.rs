use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    PagingConfig,
    coordinator::Coordinator,
    flow::{FlowShared, PagingFlow},
};
use crate::{
    observers::{Observe, ObserverSet},
    upstream::UpstreamRef,
};

/// Builder for constructing a [`PagingFlow`] with optional features.
pub struct PagingFlowBuilder<T> {
    upstream: UpstreamRef<T>,
    cfg: PagingConfig,
    scope: Option<CancellationToken>,
    observers: Vec<Arc<dyn Observe>>,
}

impl<T> PagingFlowBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new builder over `upstream` with the default configuration.
    pub fn new(upstream: UpstreamRef<T>) -> Self {
        Self {
            upstream,
            cfg: PagingConfig::default(),
            scope: None,
            observers: Vec::new(),
        }
    }

    /// Sets the flow configuration.
    pub fn with_config(mut self, cfg: PagingConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Binds the flow to an owning scope.
    ///
    /// The flow runs under a child of `scope`: cancelling the scope closes the
    /// flow, cancelling the flow leaves the scope untouched.
    pub fn with_scope(mut self, scope: &CancellationToken) -> Self {
        self.scope = Some(scope.child_token());
        self
    }

    /// Sets lifecycle observers.
    ///
    /// Observers receive flow events (subscribers joining and leaving,
    /// activations, closure) through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Builds the flow and spawns its coordinator.
    ///
    /// This consumes the builder and initializes:
    /// - the shared channel, subscriber registry, state cell and event bus;
    /// - the observer workers (if any observers are set), which follow the bus
    ///   until the flow handle and every subscription are gone;
    /// - the coordinator task, idle until the first subscriber.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> PagingFlow<T> {
        let shared = Arc::new(FlowShared::new(self.upstream.name(), self.cfg));
        let token = self.scope.unwrap_or_default();
        let stopped = CancellationToken::new();

        if !self.observers.is_empty() {
            let set = ObserverSet::new(self.observers, shared.bus.downgrade());
            tokio::spawn(set.run(shared.bus.subscribe()));
        }

        let coordinator = Coordinator::new(Arc::clone(&shared), self.upstream, stopped.clone());
        let join = tokio::spawn(coordinator.run(token.clone()));

        PagingFlow::from_parts(shared, token, stopped, join)
    }
}
