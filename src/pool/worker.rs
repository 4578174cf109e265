//! # Worker process plumbing.
//!
//! Spawns one worker process per slot and bridges it onto the coordinator's
//! event channel. The wire format is line-delimited JSON over the child's
//! standard streams; stderr is inherited so worker-side failure detail lands
//! on the parent's stderr.
//!
//! ## Architecture
//! ```text
//! spawn_worker(slot, cfg, events)
//!     │
//!     ├─► writer task: outbox ──► child stdin  (one JSON array per line)
//!     │
//!     └─► reader task (owns Child):
//!            child stdout line ── parsed ──► Msg::Worker(Reply { payload })
//!                               ── invalid ─► Msg::Worker(Fault { reason })
//!            EOF → child.wait() ───────────► Msg::Worker(Exited { code })
//!            kill token cancelled ─────────► child.start_kill()
//! ```
//!
//! ## Rules
//! - The `Child` is owned by the reader task; nothing else addresses the
//!   process.
//! - `Exited` is always the final event a worker emits, including after a
//!   teardown kill (the coordinator ignores it once the slot is tombstoned).
//! - Kill-by-signal has no exit code; it is reported as `-1` (non-zero, so
//!   treated as abnormal).

use std::io;
use std::process::Stdio;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;

use super::dispatcher::Msg;

/// An event reported by a worker's reader task, tagged with the slot index
/// it belongs to.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    /// The process sent back a result payload.
    Reply { slot: usize, payload: Value },
    /// The process produced output that is not a valid reply, or the stream
    /// broke mid-read.
    Fault { slot: usize, reason: String },
    /// The process terminated.
    Exited { slot: usize, code: i32 },
}

/// Exclusively-owned handle to one worker process.
///
/// Holds the outbox feeding the worker's stdin and the token that triggers
/// its kill. Dropping the handle closes the outbox, which closes the
/// worker's stdin.
pub(crate) struct WorkerHandle {
    outbox: mpsc::UnboundedSender<Vec<Value>>,
    kill: CancellationToken,
}

impl WorkerHandle {
    /// Queues one argument list for delivery to the worker.
    ///
    /// Fire-and-forget: if the writer task is gone the send is dropped and
    /// the pending `Exited` event settles the slot.
    pub fn send(&self, args: Vec<Value>) {
        let _ = self.outbox.send(args);
    }

    /// Signals the reader task to kill the process.
    pub fn kill(&self) {
        self.kill.cancel();
    }

    /// A handle wired to a bare channel instead of a process, for exercising
    /// placement logic without spawning anything.
    #[cfg(test)]
    pub fn stub() -> (Self, mpsc::UnboundedReceiver<Vec<Value>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                outbox: tx,
                kill: CancellationToken::new(),
            },
            rx,
        )
    }
}

/// Spawns the worker process for `slot` and its writer/reader tasks.
///
/// Reply, fault, and exit events flow into `events` — the same ordered
/// channel the coordinator consumes submissions from, so slot state is only
/// ever touched by one control flow.
pub(crate) fn spawn_worker(
    slot: usize,
    cfg: &PoolConfig,
    events: mpsc::Sender<Msg>,
) -> io::Result<WorkerHandle> {
    let mut child = Command::new(&cfg.program)
        .args(&cfg.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "worker stdin not captured"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "worker stdout not captured"))?;

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<Value>>();
    let kill = CancellationToken::new();

    // Writer: serialize each argument list as one JSON array per line.
    tokio::spawn(async move {
        while let Some(args) = out_rx.recv().await {
            let mut line = match serde_json::to_vec(&Value::Array(args)) {
                Ok(line) => line,
                Err(_) => continue,
            };
            line.push(b'\n');
            if stdin.write_all(&line).await.is_err() {
                break;
            }
            if stdin.flush().await.is_err() {
                break;
            }
        }
    });

    // Reader: owns the child; reports replies, faults, and finally the exit.
    let kill_rx = kill.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                _ = kill_rx.cancelled() => {
                    let _ = child.start_kill();
                    break;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let ev = match serde_json::from_str::<Value>(&line) {
                            Ok(payload) => WorkerEvent::Reply { slot, payload },
                            Err(err) => WorkerEvent::Fault {
                                slot,
                                reason: format!("invalid reply line: {err}"),
                            },
                        };
                        if events.send(Msg::Worker(ev)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let fault = WorkerEvent::Fault {
                            slot,
                            reason: format!("read error: {err}"),
                        };
                        let _ = events.send(Msg::Worker(fault)).await;
                        break;
                    }
                }
            }
        }

        let code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(-1),
            Err(_) => -1,
        };
        let _ = events.send(Msg::Worker(WorkerEvent::Exited { slot, code })).await;
    });

    Ok(WorkerHandle { outbox: out_tx, kill })
}
