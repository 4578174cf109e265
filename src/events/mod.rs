//! Dispatcher events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while the pool places, drains, and
//! completes tasks and grows or tears down workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! The only publisher is the pool coordinator; consumers are
//! [`Pool::events`](crate::Pool::events) receivers and the subscriber
//! listener feeding the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
