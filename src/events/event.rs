//! # Runtime events emitted by the dispatcher.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker lifecycle**: slot creation, idle teardown, process exit
//! - **Task flow**: dispatch, backlog queueing, backlog drain
//! - **Task outcome**: completion and failure
//! - **Subscriber plumbing**: dropped deliveries and caught panics
//!
//! The [`Event`] struct carries additional metadata such as the worker slot
//! index, process exit code, backlog depth, and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use forkpool::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskFailed)
//!     .with_worker(2)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.worker, Some(2));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of dispatcher events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker lifecycle ===
    /// A new worker process was spawned for a fresh slot.
    ///
    /// Sets:
    /// - `worker`: slot index
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WorkerSpawned,

    /// An idle worker was torn down (its slot queue and the backlog were
    /// both empty).
    ///
    /// Sets:
    /// - `worker`: slot index
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WorkerTerminated,

    /// A worker process exited on its own (observed by the reader task).
    ///
    /// Sets:
    /// - `worker`: slot index
    /// - `code`: exit code (`-1` when killed by a signal)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WorkerExited,

    // === Task flow ===
    /// A task was sent directly to a worker at submission time.
    ///
    /// Sets:
    /// - `worker`: slot index
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskDispatched,

    /// No slot had room and the pool was at its ceiling; the task joined
    /// the backlog.
    ///
    /// Sets:
    /// - `queued`: backlog depth after the push
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskQueued,

    /// A backlogged task was drained onto a worker that freed capacity.
    ///
    /// Sets:
    /// - `worker`: slot index
    /// - `queued`: backlog depth after the pop
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskDrained,

    // === Task outcome ===
    /// A worker replied and the oldest in-flight task on its slot resolved.
    ///
    /// Sets:
    /// - `worker`: slot index
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskCompleted,

    /// The oldest in-flight task on a slot was rejected (worker fault,
    /// abnormal exit, or spawn failure).
    ///
    /// Sets:
    /// - `worker`: slot index (absent for spawn failures)
    /// - `reason`: failure label/message
    /// - `code`: exit code, for abnormal exits
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskFailed,

    // === Pool lifecycle ===
    /// The pool was shut down; remaining workers were killed.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PoolClosed,

    // === Subscriber plumbing ===
    /// A subscriber's bounded queue refused an event; the event was dropped
    /// for that subscriber only.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,

    /// A subscriber panicked inside `on_event`; the panic was caught and
    /// that subscriber's worker kept running.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,
}

/// Dispatcher event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker slot index, if applicable.
    pub worker: Option<usize>,
    /// Process exit code, for exit-related events.
    pub code: Option<i32>,
    /// Backlog depth, for queue/drain events.
    pub queued: Option<usize>,
    /// Human-readable reason (faults, failures, panic messages).
    pub reason: Option<Arc<str>>,
    /// Subscriber name, for subscriber-plumbing events.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            code: None,
            queued: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Shorthand for a [`SubscriberOverflow`](EventKind::SubscriberOverflow)
    /// report.
    pub fn subscriber_overflow(name: &'static str, reason: &'static str) -> Self {
        Self::now(EventKind::SubscriberOverflow)
            .with_subscriber(name)
            .with_reason(reason)
    }

    /// Shorthand for a [`SubscriberPanicked`](EventKind::SubscriberPanicked)
    /// report.
    pub fn subscriber_panicked(name: &'static str, info: impl Into<Arc<str>>) -> Self {
        Self::now(EventKind::SubscriberPanicked)
            .with_subscriber(name)
            .with_reason(info)
    }

    /// Attaches a worker slot index.
    #[inline]
    pub fn with_worker(mut self, index: usize) -> Self {
        self.worker = Some(index);
        self
    }

    /// Attaches a process exit code.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches the backlog depth.
    #[inline]
    pub fn with_queued(mut self, depth: usize) -> Self {
        self.queued = Some(depth);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a subscriber name.
    #[inline]
    pub fn with_subscriber(mut self, name: &'static str) -> Self {
        self.subscriber = Some(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::now(EventKind::WorkerSpawned);
        let b = Event::now(EventKind::WorkerSpawned);
        assert!(b.seq > a.seq);
    }
}
