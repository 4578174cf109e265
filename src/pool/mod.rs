//! Dispatcher core: slots, backlog, worker plumbing, and the pool surface.
//!
//! This module contains the embedded implementation of the process pool.
//! The public API from this module is [`Pool`], [`PoolHandle`], and
//! [`TaskFuture`]; everything else is coordinator-internal state.
//!
//! Internal modules:
//! - [`slot`]: one worker process handle plus its in-flight FIFO queue;
//! - [`backlog`]: the global submission-ordered overflow queue;
//! - [`worker`]: child process spawning and stdio bridging;
//! - [`core`]: placement, drain, and teardown policy over the slot arena;
//! - [`dispatcher`]: the public surface and the coordination loop.

mod backlog;
mod core;
mod dispatcher;
mod slot;
mod worker;

pub use dispatcher::{Pool, PoolHandle, TaskFuture};
