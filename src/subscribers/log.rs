//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [spawned] worker=0
//! [dispatched] worker=0
//! [queued] backlog=3
//! [drained] worker=1 backlog=2
//! [completed] worker=0
//! [failed] worker=0 err="worker fault: ..." code=None
//! [exited] worker=0 code=3
//! [terminated] worker=0
//! [closed]
//! [subscriber-overflow] subscriber=Some("metrics") reason=Some("full")
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use — implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::WorkerSpawned => {
                println!("[spawned] worker={:?}", e.worker);
            }
            EventKind::WorkerTerminated => {
                println!("[terminated] worker={:?}", e.worker);
            }
            EventKind::WorkerExited => {
                println!("[exited] worker={:?} code={:?}", e.worker, e.code);
            }
            EventKind::TaskDispatched => {
                println!("[dispatched] worker={:?}", e.worker);
            }
            EventKind::TaskQueued => {
                println!("[queued] backlog={:?}", e.queued);
            }
            EventKind::TaskDrained => {
                println!("[drained] worker={:?} backlog={:?}", e.worker, e.queued);
            }
            EventKind::TaskCompleted => {
                println!("[completed] worker={:?}", e.worker);
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] worker={:?} err={:?} code={:?}",
                    e.worker, e.reason, e.code
                );
            }
            EventKind::PoolClosed => {
                println!("[closed]");
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
