//! Error types used by the forkpool dispatcher and task futures.
//!
//! This module defines two main error enums:
//!
//! - [`SubmitError`] — errors raised at submission time, before a task enters
//!   the pool.
//! - [`TaskError`] — errors delivered through a task's future when the worker
//!   side fails.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use thiserror::Error;

/// # Errors raised when handing a task to the pool.
///
/// These are submission-side failures: the task never reached the
/// dispatcher's state and no future for it exists.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The pool has been shut down; its coordinator no longer accepts work.
    #[error("pool is closed")]
    Closed,

    /// The coordinator inbox is full (only returned by `try_submit`).
    #[error("submission queue is full")]
    Full,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use forkpool::SubmitError;
    ///
    /// assert_eq!(SubmitError::Closed.as_label(), "submit_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Closed => "submit_closed",
            SubmitError::Full => "submit_full",
        }
    }
}

/// # Errors delivered through a task's future.
///
/// Once a task is accepted, every failure surfaces here — the dispatcher
/// never retries and never restarts a crashed worker on its own.
///
/// Note that a *handler* failure inside the worker process is not one of
/// these: it comes back as an ordinary reply carrying the `null` sentinel
/// (see [`adapter`](crate::adapter)), indistinguishable from a handler that
/// legitimately returned `null`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The worker reported a fault for the oldest in-flight task on its slot
    /// (unparseable reply line or a broken pipe mid-stream).
    #[error("worker fault: {reason}")]
    Fault {
        /// Description of the fault.
        reason: String,
    },

    /// The worker process terminated abnormally while this task was the
    /// oldest one in-flight on its slot.
    #[error("worker process exited with code {code}")]
    Exited {
        /// Exit code of the worker process (`-1` when killed by a signal).
        code: i32,
    },

    /// Spawning a new worker process for this task failed.
    #[error("failed to spawn worker: {reason}")]
    Spawn {
        /// The underlying spawn error message.
        reason: String,
    },

    /// The pool was shut down before the task produced a result.
    #[error("pool closed before the task completed")]
    Closed,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use forkpool::TaskError;
    ///
    /// let err = TaskError::Exited { code: 3 };
    /// assert_eq!(err.as_label(), "task_worker_exited");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fault { .. } => "task_worker_fault",
            TaskError::Exited { .. } => "task_worker_exited",
            TaskError::Spawn { .. } => "task_spawn_failed",
            TaskError::Closed => "task_pool_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fault { reason } => format!("fault: {reason}"),
            TaskError::Exited { code } => format!("exited: code={code}"),
            TaskError::Spawn { reason } => format!("spawn: {reason}"),
            TaskError::Closed => "pool closed".to_string(),
        }
    }
}
