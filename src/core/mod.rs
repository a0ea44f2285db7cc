//! Runtime core: shared flow, coordination and delivery.
//!
//! This module contains the implementation of a paging flow.
//! The public API from this module is [`PagingFlow`] (with its builder and
//! [`Subscription`]), plus the [`PagingConfig`] it is built from.
//!
//! Internal modules:
//! - [`channel`]: replay-of-latest broadcast with a closed marker;
//! - [`registry`]: live subscriber count with an atomic cap check;
//! - [`consumer`]: reads one activation of the upstream into the channel;
//! - [`coordinator`]: starts/stops activations and owns teardown;
//! - [`flow`]: public handle, shared state, subscribe and cancel;
//! - [`subscription`]: one subscriber's inbox and registry lease.

mod builder;
mod channel;
mod config;
mod consumer;
mod coordinator;
mod flow;
mod registry;
mod subscription;

pub use builder::PagingFlowBuilder;
pub use channel::Delivery;
pub use config::PagingConfig;
pub use flow::{FlowState, PagingFlow};
pub use subscription::Subscription;
