//! # forkpool
//!
//! **Forkpool** is a process-pool task dispatcher for Rust.
//!
//! It offloads units of work (opaque, ordered argument lists) to a bounded
//! set of worker OS processes: load is balanced first-fit across workers,
//! the pool grows lazily up to a hardware-derived ceiling, overflow work
//! queues in a global backlog, and idle workers are torn down to zero.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  callers                       ┌────────────────────────────────────────┐
//!  submit(args) ───────────────► │  Coordinator (single control flow)     │
//!  submit(args) ───────────────► │  - slot arena (stable indices,         │
//!       ...        mpsc<Msg>     │    tombstones never reused)            │
//!                  ▲             │  - Backlog (global FIFO, unbounded)    │
//!                  │             │  - Bus (broadcast events)              │
//!   Reply/Fault/Exited events    └──┬──────────────┬──────────────┬───────┘
//!                  │                ▼              ▼              ▼
//!                  │          ┌──────────┐   ┌──────────┐   ┌──────────┐
//!                  │          │  Slot 0  │   │  Slot 1  │   │  Slot N  │
//!                  │          │ queue ≤C │   │ queue ≤C │   │ queue ≤C │
//!                  │          └────┬─────┘   └────┬─────┘   └────┬─────┘
//!                  │               ▼              ▼              ▼
//!                  │          worker proc    worker proc    worker proc
//!                  └───────────── JSON lines over stdin/stdout ──────────
//! ```
//!
//! ### Task lifecycle
//! ```text
//! submit(args) ──► Msg::Submit ──► placement:
//!   ├─► first Active slot with queue < C   ──► send args, queue task
//!   ├─► none, active < max_workers         ──► spawn worker, send to new slot
//!   └─► otherwise                          ──► push onto Backlog
//!
//! worker reply  ──► resolve oldest task on that slot (positional correlation)
//! worker fault  ──► reject oldest task on that slot
//!     then: drain Backlog onto free capacity (submission order),
//!           teardown-check (slot queue empty AND Backlog empty → kill worker)
//!
//! worker exit (abnormal) ──► reject only the oldest queued task with the
//!     exit code; tasks behind it never settle (deliberate, documented quirk)
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                  |
//! |-------------------|---------------------------------------------------------------------|-------------------------------------|
//! | **Pool**          | Start, submit, observe, and shut down a pool of worker processes.   | [`Pool`], [`PoolHandle`], [`TaskFuture`] |
//! | **Configuration** | Worker executable and policy knobs with fixed-policy defaults.      | [`PoolConfig`]                      |
//! | **Errors**        | Typed errors for submission and task settlement.                    | [`SubmitError`], [`TaskError`]      |
//! | **Events**        | Worker/task lifecycle events over a broadcast bus.                  | [`Event`], [`EventKind`], [`Bus`]   |
//! | **Subscriber API**| Hook into pool events (logging, metrics, custom subscribers).       | [`Subscribe`], [`SubscriberSet`]    |
//! | **Worker side**   | Line-oriented stdio adapter applying tasks to a handler.            | [`adapter::serve`]                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Guarantees and non-guarantees
//! - Within one slot, tasks are sent and answered strictly FIFO; a reply is
//!   matched to the **oldest** in-flight task on that slot. There is no
//!   request identifier — the worker must answer in arrival order.
//! - Backlogged tasks reach workers in submission order relative to each
//!   other; no completion ordering is promised across slots.
//! - Tasks are never refused for lack of capacity and never retried; a
//!   crashed worker is never restarted (fresh capacity comes from new
//!   submissions growing the pool again).
//! - A worker-side handler failure surfaces as a reply carrying JSON
//!   `null`, not as an error — indistinguishable from a handler that
//!   legitimately returned `null`.
//!
//! ## Example
//! ```no_run
//! use forkpool::{Pool, PoolConfig};
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Pool::start(PoolConfig::new("./image-worker"));
//!
//!     let fut = pool.submit(vec![json!("thumbnail"), json!("in.png")]).await?;
//!     let reply = fut.await?;
//!     println!("worker replied: {reply}");
//!
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod adapter;
mod config;
mod error;
mod events;
mod pool;
mod subscribers;

// ---- Public re-exports ----

pub use config::PoolConfig;
pub use error::{SubmitError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use pool::{Pool, PoolHandle, TaskFuture};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
