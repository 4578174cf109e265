//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught; the worker keeps running and a
//!   [`SubscriberPanicked`](EventKind::SubscriberPanicked) report lands on
//!   the bus.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow: the event is dropped for
//!   that subscriber and a
//!   [`SubscriberOverflow`](EventKind::SubscriberOverflow) report lands on
//!   the bus. Plumbing reports are never re-reported, so a full queue
//!   cannot feed itself.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//!                  │                           │
//!                  └── full/closed ────────────┴── panic
//!                        Bus ◄── SubscriberOverflow / SubscriberPanicked
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};

use super::Subscribe;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Delivery failures and caught panics are reported back through `bus`
    /// as subscriber-plumbing events.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);
            let report = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let plumbing = is_plumbing(ev.kind);
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        // A panic on a plumbing report stays off the bus,
                        // otherwise a panicking subscriber would feed itself.
                        if !plumbing {
                            report.publish(Event::subscriber_panicked(
                                s.name(),
                                panic_message(panic_err.as_ref()),
                            ));
                        }
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and a
    /// [`SubscriberOverflow`](EventKind::SubscriberOverflow) report is
    /// published, naming the subscriber.
    pub fn emit(&self, event: &Event) {
        let plumbing = is_plumbing(event.kind);
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !plumbing {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !plumbing {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

fn is_plumbing(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
    )
}

/// Best-effort extraction of a panic payload message.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::timeout;

    use super::*;

    struct Explosive;

    #[async_trait]
    impl Subscribe for Explosive {
        async fn on_event(&self, _event: &Event) {
            panic!("kaboom");
        }

        fn name(&self) -> &'static str {
            "explosive"
        }
    }

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _event: &Event) {
            std::future::pending::<()>().await;
        }

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported_and_keeps_running() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explosive)], bus.clone());

        set.emit(&Event::now(EventKind::PoolClosed));
        set.emit(&Event::now(EventKind::PoolClosed));

        // Two deliveries, two caught panics: the worker survived the first.
        for _ in 0..2 {
            let ev = loop {
                let ev = timeout(Duration::from_secs(2), rx.recv())
                    .await
                    .unwrap()
                    .unwrap();
                if ev.kind == EventKind::SubscriberPanicked {
                    break ev;
                }
            };
            assert_eq!(ev.subscriber, Some("explosive"));
            assert_eq!(ev.reason.as_deref(), Some("kaboom"));
        }

        set.shutdown().await;
    }

    #[tokio::test]
    async fn overflow_is_reported_with_the_subscriber_name() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stuck)], bus.clone());

        // Capacity is 1 and the worker never finishes: later emits overflow.
        for _ in 0..4 {
            set.emit(&Event::now(EventKind::PoolClosed));
        }

        let ev = loop {
            let ev = timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            if ev.kind == EventKind::SubscriberOverflow {
                break ev;
            }
        };
        assert_eq!(ev.subscriber, Some("stuck"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
    }
}
