//! # Dispatcher state: slot arena, backlog, and the policies over them.
//!
//! [`PoolCore`] owns every piece of mutable dispatcher state. It is only
//! ever touched from the coordinator task, which processes one message at a
//! time — mutual exclusion is structural, so no locks appear here.
//!
//! ## Policies
//! ```text
//! Placement (per submission):
//!   1. first Active slot with queue < capacity  → dispatch there
//!   2. none, and active < max_workers           → grow, dispatch to new slot
//!   3. otherwise                                → push onto backlog
//!
//! Reply/Fault (per worker event):
//!   pop oldest task on that slot → resolve/reject
//!   → drain backlog onto any slot with room (submission order)
//!   → teardown-check: slot queue empty AND backlog empty → kill worker
//!
//! Exit (abnormal):
//!   reject only the oldest queued task with the exit code; tasks behind it
//!   stay unresolved on the tombstone. No drain, no teardown-check.
//! ```
//!
//! ## Rules
//! - Slot indices are stable: tombstones are never removed or reused.
//! - The backlog drains strictly in submission order; which slot receives a
//!   drained task is first-fit, not least-loaded.
//! - Teardown demands *global* emptiness (slot queue and backlog), so a
//!   worker is never killed while other callers still await capacity.

use serde_json::Value;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

use super::backlog::Backlog;
use super::slot::{Pending, Slot};
use super::worker::{WorkerEvent, WorkerHandle};

/// All dispatcher state, exclusively owned by the coordinator task.
pub(crate) struct PoolCore {
    /// Slot arena; indices are stable, terminated slots stay as tombstones.
    slots: Vec<Slot>,
    /// Global overflow FIFO.
    backlog: Backlog,
    /// Number of currently Active slots.
    active: usize,
    /// Per-slot in-flight capacity.
    capacity: usize,
    /// Ceiling on simultaneously Active slots.
    max_workers: usize,
    /// Event sink.
    bus: Bus,
}

impl PoolCore {
    pub fn new(capacity: usize, max_workers: usize, bus: Bus) -> Self {
        Self {
            slots: Vec::new(),
            backlog: Backlog::new(),
            active: 0,
            capacity,
            max_workers,
            bus,
        }
    }

    /// First Active slot with spare capacity, in index order.
    pub fn find_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.has_room(self.capacity))
    }

    /// True while a new slot may still be created.
    pub fn can_grow(&self) -> bool {
        self.active < self.max_workers
    }

    /// Index the next created slot will occupy.
    pub fn next_index(&self) -> usize {
        self.slots.len()
    }

    /// Appends a fresh Active slot owning `worker` and returns its index.
    pub fn install_slot(&mut self, worker: WorkerHandle) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot::new(worker));
        self.active += 1;
        self.bus
            .publish(Event::now(EventKind::WorkerSpawned).with_worker(index));
        index
    }

    /// Sends `task` to the slot at `index` and records it in-flight.
    pub fn assign(&mut self, index: usize, task: Pending) {
        self.slots[index].dispatch(task);
        self.bus
            .publish(Event::now(EventKind::TaskDispatched).with_worker(index));
    }

    /// Appends `task` to the backlog (no slot had room, pool at ceiling).
    pub fn enqueue(&mut self, task: Pending) {
        self.backlog.push(task);
        self.bus
            .publish(Event::now(EventKind::TaskQueued).with_queued(self.backlog.len()));
    }

    /// Applies one worker event to the state.
    pub fn on_event(&mut self, ev: WorkerEvent) {
        match ev {
            WorkerEvent::Reply { slot, payload } => self.on_reply(slot, payload),
            WorkerEvent::Fault { slot, reason } => self.on_fault(slot, reason),
            WorkerEvent::Exited { slot, code } => self.on_exit(slot, code),
        }
    }

    /// Rejects a task whose growth attempt failed to spawn a worker. No
    /// slot was created; later submissions may try to grow again.
    pub fn reject_spawn_failure(&mut self, task: Pending, reason: String) {
        self.bus
            .publish(Event::now(EventKind::TaskFailed).with_reason(reason.clone()));
        let _ = task.reply.send(Err(TaskError::Spawn { reason }));
    }

    /// Kills every remaining Active worker (pool shutdown). Tasks still
    /// queued anywhere settle with [`TaskError::Closed`] when the core is
    /// dropped and their reply senders go with it.
    pub fn kill_all(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_active() {
                self.slots[index].terminate();
                self.active -= 1;
            }
        }
        self.bus.publish(Event::now(EventKind::PoolClosed));
    }

    /// Reply from a worker: resolve the oldest in-flight task on that slot,
    /// then redistribute the backlog and re-check the slot for teardown.
    fn on_reply(&mut self, index: usize, payload: Value) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.is_active() {
            return;
        }
        if let Some(task) = slot.pop_oldest() {
            let _ = task.reply.send(Ok(payload));
            self.bus
                .publish(Event::now(EventKind::TaskCompleted).with_worker(index));
        }
        self.drain();
        self.teardown_check(index);
    }

    /// Fault from a worker: reject the oldest in-flight task on that slot,
    /// then drain and teardown-check exactly like a reply.
    fn on_fault(&mut self, index: usize, reason: String) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.is_active() {
            return;
        }
        if let Some(task) = slot.pop_oldest() {
            self.bus.publish(
                Event::now(EventKind::TaskFailed)
                    .with_worker(index)
                    .with_reason(reason.clone()),
            );
            let _ = task.reply.send(Err(TaskError::Fault { reason }));
        }
        self.drain();
        self.teardown_check(index);
    }

    /// Process exit. Abnormal exits reject only the oldest queued task with
    /// the exit code; anything queued behind it is left unresolved on the
    /// tombstone — a deliberate, documented quirk of the exit path, not an
    /// oversight. The slot is tombstoned either way so placement can never
    /// select the dead process, and no drain or teardown-check runs on this
    /// path.
    fn on_exit(&mut self, index: usize, code: i32) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.is_active() {
            // Teardown-initiated exit; the slot settled already.
            return;
        }
        if code != 0 {
            if let Some(task) = slot.pop_oldest() {
                self.bus.publish(
                    Event::now(EventKind::TaskFailed)
                        .with_worker(index)
                        .with_code(code)
                        .with_reason("worker process exited"),
                );
                let _ = task.reply.send(Err(TaskError::Exited { code }));
            }
        }
        slot.terminate();
        self.active -= 1;
        self.bus.publish(
            Event::now(EventKind::WorkerExited)
                .with_worker(index)
                .with_code(code),
        );
    }

    /// Moves backlogged tasks onto slots with spare capacity, oldest first,
    /// until the backlog empties or no eligible slot remains.
    fn drain(&mut self) {
        loop {
            if self.backlog.is_empty() {
                break;
            }
            let Some(index) = self.find_slot() else {
                break;
            };
            let Some(task) = self.backlog.pop() else {
                break;
            };
            self.slots[index].dispatch(task);
            self.bus.publish(
                Event::now(EventKind::TaskDrained)
                    .with_worker(index)
                    .with_queued(self.backlog.len()),
            );
        }
    }

    /// Scale-to-zero: kill the slot's worker once its own queue **and** the
    /// backlog are empty. The tombstone keeps its index; fresh capacity is
    /// always a new slot.
    fn teardown_check(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.is_active() || !slot.queue_is_empty() || !self.backlog.is_empty() {
            return;
        }
        slot.terminate();
        self.active -= 1;
        self.bus
            .publish(Event::now(EventKind::WorkerTerminated).with_worker(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio::sync::oneshot;

    fn core(capacity: usize, max_workers: usize) -> PoolCore {
        PoolCore::new(capacity, max_workers, Bus::new(8))
    }

    fn install_stub(core: &mut PoolCore) -> (usize, mpsc::UnboundedReceiver<Vec<Value>>) {
        let (handle, rx) = WorkerHandle::stub();
        (core.install_slot(handle), rx)
    }

    fn pending(tag: i64) -> (Pending, oneshot::Receiver<Result<Value, TaskError>>) {
        let (tx, rx) = oneshot::channel();
        (
            Pending {
                args: vec![json!(tag)],
                reply: tx,
            },
            rx,
        )
    }

    #[test]
    fn first_fit_skips_full_slots() {
        let mut core = core(2, 3);
        let (s0, _rx0) = install_stub(&mut core);
        let (s1, _rx1) = install_stub(&mut core);
        assert_eq!(core.find_slot(), Some(s0));

        for tag in 0..2 {
            let (task, _reply) = pending(tag);
            core.assign(s0, task);
        }
        assert_eq!(core.find_slot(), Some(s1));
    }

    #[test]
    fn placement_ignores_tombstones() {
        let mut core = core(2, 2);
        let (s0, _rx0) = install_stub(&mut core);
        core.on_exit(s0, 9);
        assert_eq!(core.find_slot(), None);
        assert!(core.can_grow());
        assert_eq!(core.next_index(), 1);
    }

    #[test]
    fn growth_stops_at_ceiling() {
        let mut core = core(5, 2);
        assert!(core.can_grow());
        let _s0 = install_stub(&mut core);
        assert!(core.can_grow());
        let _s1 = install_stub(&mut core);
        assert!(!core.can_grow());
    }

    #[test]
    fn drain_moves_backlog_in_submission_order() {
        let mut core = core(2, 1);
        let (s0, mut outbox) = install_stub(&mut core);

        let (t0, mut r0) = pending(0);
        let (t1, _r1) = pending(1);
        core.assign(s0, t0);
        core.assign(s0, t1);

        // Slot full, ceiling reached: these overflow into the backlog.
        let (t2, _r2) = pending(2);
        let (t3, _r3) = pending(3);
        core.enqueue(t2);
        core.enqueue(t3);

        core.on_reply(s0, json!("done"));
        assert_eq!(r0.try_recv().unwrap(), Ok(json!("done")));

        // The freed capacity was refilled from the backlog head.
        assert_eq!(outbox.try_recv().unwrap(), vec![json!(0)]);
        assert_eq!(outbox.try_recv().unwrap(), vec![json!(1)]);
        assert_eq!(outbox.try_recv().unwrap(), vec![json!(2)]);
        assert!(outbox.try_recv().is_err());

        core.on_reply(s0, json!("done"));
        assert_eq!(outbox.try_recv().unwrap(), vec![json!(3)]);
    }

    #[test]
    fn teardown_requires_global_emptiness() {
        let mut core = core(5, 1);
        let (s0, _outbox) = install_stub(&mut core);

        let (t0, _r0) = pending(0);
        core.assign(s0, t0);
        let (t1, _r1) = pending(1);
        core.enqueue(t1);

        // Reply drains the backlogged task onto the slot, so the slot stays
        // busy and must not be torn down.
        core.on_reply(s0, json!(null));
        assert_eq!(core.active, 1);

        // Second reply leaves slot and backlog empty: scale to zero.
        core.on_reply(s0, json!(null));
        assert_eq!(core.active, 0);
        assert_eq!(core.find_slot(), None);
        assert!(core.can_grow());
    }

    #[test]
    fn abnormal_exit_rejects_only_the_oldest() {
        let mut core = core(5, 1);
        let (s0, _outbox) = install_stub(&mut core);

        let (t0, mut r0) = pending(0);
        let (t1, mut r1) = pending(1);
        let (t2, mut r2) = pending(2);
        core.assign(s0, t0);
        core.assign(s0, t1);
        core.assign(s0, t2);

        core.on_exit(s0, 7);

        assert_eq!(r0.try_recv().unwrap(), Err(TaskError::Exited { code: 7 }));
        // The survivors are abandoned, not settled: their senders live on
        // the tombstone, so the receivers still report Empty.
        assert!(matches!(
            r1.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
        assert!(matches!(
            r2.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
        assert_eq!(core.active, 0);
    }

    #[test]
    fn clean_exit_rejects_nothing() {
        let mut core = core(5, 1);
        let (s0, _outbox) = install_stub(&mut core);
        let (t0, mut r0) = pending(0);
        core.assign(s0, t0);

        core.on_exit(s0, 0);
        assert!(matches!(
            r0.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
        assert_eq!(core.active, 0);
    }

    #[test]
    fn reply_on_empty_queue_is_ignored() {
        let mut core = core(5, 1);
        let (s0, _outbox) = install_stub(&mut core);
        core.on_reply(s0, json!(1));
        core.on_fault(s0, "noise".into());
        assert_eq!(core.active, 0); // teardown fired: queue and backlog empty
    }

    #[test]
    fn stale_events_after_exit_are_ignored() {
        let mut core = core(5, 1);
        let (s0, _outbox) = install_stub(&mut core);
        core.on_exit(s0, 3);
        core.on_reply(s0, json!(1));
        core.on_exit(s0, 3);
        assert_eq!(core.active, 0);
    }
}
