//! # Pool: public surface and the coordination loop.
//!
//! [`Pool`] owns the event bus, the coordinator task, and the shutdown
//! token. [`PoolHandle`] is the cloneable submitter; [`TaskFuture`] is the
//! per-task continuation resolved by worker events.
//!
//! ## High-level architecture
//! ```text
//! Callers:                         Coordinator (one task):
//!   handle.submit(args) ──┐
//!   handle.submit(args) ──┼──► mpsc<Msg> ──► run loop ──► PoolCore
//!            ...          │        ▲            │    (slots, backlog, active)
//! Worker reader tasks ────┘        │            │
//!   Reply / Fault / Exited ────────┘            ├─► WorkerHandle.send(args)
//!                                               ├─► spawn_worker() on growth
//!                                               └─► Bus.publish(Event)
//! ```
//!
//! Submissions and worker events share **one ordered channel**, so every
//! mutation of slot queues, the backlog, and the active count happens on a
//! single control flow — no two handlers ever interleave, and no locks are
//! involved.
//!
//! ## Ordering guarantees
//! - Within one slot, replies settle tasks oldest-first (positional
//!   correlation; the worker must answer in arrival order).
//! - Backlogged tasks are drained in submission order relative to each
//!   other; across slots no completion ordering is promised.
//!
//! ## Shutdown path
//! ```text
//! Pool::shutdown()
//!    └─► token.cancel() ──► coordinator breaks out of the loop
//!           └─► PoolCore::kill_all(): kill remaining workers,
//!               publish PoolClosed; undelivered tasks settle
//!               with TaskError::Closed
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::{SubmitError, TaskError};
use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::core::PoolCore;
use super::slot::Pending;
use super::worker::{self, WorkerEvent};

/// A message on the coordinator's single ordered channel.
pub(crate) enum Msg {
    /// A caller handed in a task.
    Submit(Pending),
    /// A worker reader task reported a reply, fault, or exit.
    Worker(WorkerEvent),
}

/// Resolves with the worker's reply, or rejects with a [`TaskError`].
///
/// Returned by [`PoolHandle::submit`]; settles at most once. A task that is
/// abandoned by an abnormal worker exit (any task queued *behind* the one
/// the exit rejected) never settles while the pool lives.
#[derive(Debug)]
pub struct TaskFuture {
    rx: oneshot::Receiver<Result<Value, TaskError>>,
}

impl Future for TaskFuture {
    type Output = Result<Value, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| match res {
            Ok(settled) => settled,
            // Reply sender dropped without settling: pool shut down.
            Err(_) => Err(TaskError::Closed),
        })
    }
}

/// Cloneable handle for submitting tasks to a running pool.
#[derive(Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<Msg>,
}

impl PoolHandle {
    /// Hands one task to the pool and returns its future.
    ///
    /// The returned [`TaskFuture`] resolves with the worker's reply payload
    /// or rejects with a [`TaskError`]. Tasks are never refused for lack of
    /// capacity — overflow waits in the backlog until a worker frees up.
    ///
    /// Awaits only while the coordinator inbox is full; it never waits for
    /// the task itself.
    pub async fn submit(&self, args: Vec<Value>) -> Result<TaskFuture, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Msg::Submit(Pending { args, reply }))
            .await
            .map_err(|_| SubmitError::Closed)?;
        Ok(TaskFuture { rx })
    }

    /// Non-blocking variant of [`submit`](Self::submit): fails with
    /// [`SubmitError::Full`] instead of waiting for inbox room.
    pub fn try_submit(&self, args: Vec<Value>) -> Result<TaskFuture, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(Msg::Submit(Pending { args, reply }))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => SubmitError::Full,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            })?;
        Ok(TaskFuture { rx })
    }
}

/// A running process pool.
///
/// Independent pools share no state; dropping the `Pool` cancels its
/// coordinator, and [`shutdown`](Pool::shutdown) additionally waits for it.
///
/// ## Example
/// ```no_run
/// use forkpool::{Pool, PoolConfig};
/// use serde_json::json;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = Pool::start(PoolConfig::new("./my-worker"));
/// let result = pool.submit(vec![json!("transcode"), json!("clip.mp4")]).await?.await?;
/// println!("worker replied: {result}");
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Pool {
    handle: PoolHandle,
    bus: Bus,
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl Pool {
    /// Starts a pool with no subscribers.
    ///
    /// Must be called from within a Tokio runtime: the coordinator is
    /// spawned immediately. No worker process is spawned until the first
    /// submission (slots are created lazily).
    pub fn start(cfg: PoolConfig) -> Self {
        Self::with_subscribers(cfg, Vec::new())
    }

    /// Starts a pool and fans events out to the given subscribers.
    pub fn with_subscribers(cfg: PoolConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let token = CancellationToken::new();
        if !subscribers.is_empty() {
            let set = SubscriberSet::new(subscribers, bus.clone());
            Self::subscriber_listener(&bus, set, token.clone());
        }

        let (tx, rx) = mpsc::channel(cfg.submit_capacity.max(1));

        let coordinator = Coordinator {
            core: PoolCore::new(
                cfg.effective_slot_capacity(),
                cfg.effective_max_workers(),
                bus.clone(),
            ),
            cfg,
            rx,
            tx: tx.clone(),
        };
        let join = tokio::spawn(coordinator.run(token.clone()));

        Self {
            handle: PoolHandle { tx },
            bus,
            token,
            join: Some(join),
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget). The set holds a bus sender for its own reports,
    /// so the listener leaves on the shutdown token rather than waiting for
    /// the channel to close.
    fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            set.shutdown().await;
        });
    }

    /// Returns a cloneable submitter detached from the pool's lifetime
    /// guard.
    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    /// Convenience: [`PoolHandle::submit`] on the built-in handle.
    pub async fn submit(&self, args: Vec<Value>) -> Result<TaskFuture, SubmitError> {
        self.handle.submit(args).await
    }

    /// Taps the event bus. Receivers only observe events published after
    /// this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the coordinator and waits for it to finish killing workers.
    ///
    /// Tasks that never reached a worker, and in-flight tasks whose worker
    /// is killed, settle with [`TaskError::Closed`].
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // Non-blocking: lets the coordinator wind down even when shutdown()
        // was never awaited.
        self.token.cancel();
    }
}

/// The single coordination task: consumes submissions and worker events in
/// arrival order and applies placement, drain, and teardown policy.
struct Coordinator {
    cfg: PoolConfig,
    core: PoolCore,
    rx: mpsc::Receiver<Msg>,
    /// Cloned into every spawned worker's reader task.
    tx: mpsc::Sender<Msg>,
}

impl Coordinator {
    async fn run(mut self, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(Msg::Submit(task)) => self.place(task),
                    Some(Msg::Worker(ev)) => self.core.on_event(ev),
                    None => break,
                }
            }
        }
        self.core.kill_all();
    }

    /// Placement policy, applied to one submission:
    /// 1. first Active slot with room;
    /// 2. else grow, if below the ceiling, and place on the fresh slot;
    /// 3. else backlog.
    fn place(&mut self, task: Pending) {
        if let Some(index) = self.core.find_slot() {
            self.core.assign(index, task);
            return;
        }

        if self.core.can_grow() {
            match worker::spawn_worker(self.core.next_index(), &self.cfg, self.tx.clone()) {
                Ok(handle) => {
                    let index = self.core.install_slot(handle);
                    self.core.assign(index, task);
                }
                Err(err) => {
                    // No slot was created; the triggering task is the only
                    // casualty.
                    self.core.reject_spawn_failure(task, err.to_string());
                }
            }
            return;
        }

        self.core.enqueue(task);
    }
}
