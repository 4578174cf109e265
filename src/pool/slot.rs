//! # Worker slot: one process handle plus its in-flight queue.
//!
//! A [`Slot`] pairs an exclusively-owned [`WorkerHandle`] with the FIFO
//! queue of tasks currently sent to that process and awaiting a reply.
//!
//! ## Rules
//! - Replies are correlated **positionally**: the oldest queued task is the
//!   one a reply belongs to. This is only correct because the worker answers
//!   tasks strictly in the order it received them.
//! - A slot transitions `Active → Terminated` exactly once; tombstoned slots
//!   keep their index in the arena forever and are never reused.

use std::collections::VecDeque;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::TaskError;

use super::worker::WorkerHandle;

/// A submitted task awaiting its reply: the argument list plus the
/// continuation resolving the caller's future.
pub(crate) struct Pending {
    /// Ordered, opaque argument list delivered to the worker.
    pub args: Vec<Value>,
    /// Resolves or rejects the caller's [`TaskFuture`](crate::TaskFuture).
    pub reply: oneshot::Sender<Result<Value, TaskError>>,
}

/// Lifecycle status of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotStatus {
    /// Owns a live worker; eligible for placement while its queue has room.
    Active,
    /// Process released; permanently ineligible (tombstone).
    Terminated,
}

/// State of a single worker slot.
pub(crate) struct Slot {
    /// Current status.
    status: SlotStatus,
    /// Handle to the owned worker process (`None` once terminated).
    worker: Option<WorkerHandle>,
    /// Tasks sent to the process and awaiting a reply (FIFO order).
    queue: VecDeque<Pending>,
}

impl Slot {
    /// Creates an active slot owning a freshly spawned worker.
    pub fn new(worker: WorkerHandle) -> Self {
        Self {
            status: SlotStatus::Active,
            worker: Some(worker),
            queue: VecDeque::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SlotStatus::Active
    }

    /// True while the slot may receive a new task: active and below the
    /// per-slot capacity.
    pub fn has_room(&self, capacity: usize) -> bool {
        self.is_active() && self.queue.len() < capacity
    }

    /// Sends the task's arguments to the worker and records it as the
    /// youngest in-flight task.
    ///
    /// Only called while `has_room` holds. A send onto a worker whose writer
    /// already hung up is silently dropped; the subsequent `Exited` event
    /// settles the queue.
    pub fn dispatch(&mut self, task: Pending) {
        if let Some(worker) = &self.worker {
            worker.send(task.args.clone());
        }
        self.queue.push_back(task);
    }

    /// Removes and returns the oldest in-flight task, if any.
    pub fn pop_oldest(&mut self) -> Option<Pending> {
        self.queue.pop_front()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[cfg(test)]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Tombstones the slot: kills the worker (if still held) and releases
    /// the handle. Tasks still queued are retained, keeping their reply
    /// senders alive, so their futures stay pending rather than observing a
    /// dropped channel.
    pub fn terminate(&mut self) {
        self.status = SlotStatus::Terminated;
        if let Some(worker) = self.worker.take() {
            worker.kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::oneshot;

    fn pending(tag: i64) -> Pending {
        let (tx, _rx) = oneshot::channel();
        Pending {
            args: vec![json!(tag)],
            reply: tx,
        }
    }

    #[test]
    fn room_respects_capacity_and_status() {
        let (handle, mut outbox) = WorkerHandle::stub();
        let mut slot = Slot::new(handle);
        assert!(slot.has_room(2));

        slot.dispatch(pending(0));
        slot.dispatch(pending(1));
        assert!(!slot.has_room(2));
        assert!(slot.has_room(3));

        // Both argument lists went to the worker, in order.
        assert_eq!(outbox.try_recv().unwrap(), vec![json!(0)]);
        assert_eq!(outbox.try_recv().unwrap(), vec![json!(1)]);

        slot.terminate();
        assert!(!slot.has_room(3));
        assert!(!slot.is_active());
    }

    #[test]
    fn pop_is_fifo() {
        let (handle, _outbox) = WorkerHandle::stub();
        let mut slot = Slot::new(handle);
        slot.dispatch(pending(7));
        slot.dispatch(pending(8));
        assert_eq!(slot.pop_oldest().unwrap().args, vec![json!(7)]);
        assert_eq!(slot.pop_oldest().unwrap().args, vec![json!(8)]);
        assert!(slot.pop_oldest().is_none());
    }

    #[test]
    fn terminate_keeps_queued_tasks() {
        let (handle, _outbox) = WorkerHandle::stub();
        let mut slot = Slot::new(handle);
        slot.dispatch(pending(1));
        slot.terminate();
        assert_eq!(slot.queue_len(), 1);
    }
}
