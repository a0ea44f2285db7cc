//! # Event observers for paging flows.
//!
//! This module provides the [`Observe`] trait, the per-flow `ObserverSet` and the
//! built-in `LogWriter` (feature `logging`) for handling lifecycle events
//! published on a flow's bus.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Coordinator ── publish(Event) ──► Bus ──► ObserverSet::run
//!                                              │
//!                                ┌─────────────┼─────────┐
//!                                ▼             ▼         ▼
//!                            LogWriter      Metrics    Custom
//! ```

mod observe;
mod set;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observe::Observe;
pub(crate) use set::ObserverSet;
