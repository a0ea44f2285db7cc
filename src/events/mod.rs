//! Flow events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish lifecycle events emitted by paging flows.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - `Bus`: one flow's broadcast channel, stamping events with the flow name
//!
//! ## Quick reference
//! - **Publishers**: `PagingFlow` (subscribe/cancel), `Subscription` (drop),
//!   `Coordinator` (state transitions), `consumer::run_activation`.
//!   Observer workers report their own overflows and panics.
//! - **Consumers**: `ObserverSet::run`, spawned by `PagingFlowBuilder::build`.

mod bus;
mod event;

pub(crate) use bus::{Bus, WeakBus};
pub use event::{Event, EventKind};
