//! # Event subscribers for the pool.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Coordinator ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                  │
//!                                           SubscriberSet::emit(&Event)
//!                                            ┌────┴────┬─────────┐
//!                                            ▼         ▼         ▼
//!                                        LogWriter  Metrics   Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use forkpool::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskFailed {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

mod set;
mod subscribe;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
