//! End-to-end scenarios against the reference worker binary.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::timeout;

use forkpool::{EventKind, Pool, PoolConfig, SubmitError, TaskError};

fn worker_cfg(max_workers: usize) -> PoolConfig {
    let mut cfg = PoolConfig::new(env!("CARGO_BIN_EXE_pool_worker"));
    cfg.max_workers = max_workers;
    cfg
}

/// Collects everything currently buffered on an event receiver.
fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<forkpool::Event>,
) -> Vec<forkpool::Event> {
    let mut seen = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        seen.push(ev);
    }
    seen
}

#[tokio::test]
async fn burst_of_twelve_resolves_on_two_workers() {
    let pool = Pool::start(worker_cfg(2));
    let mut events = pool.events();

    let mut futs = Vec::new();
    for i in 0..12 {
        let fut = pool
            .submit(vec![json!("sleep-echo"), json!(20), json!(i)])
            .await
            .expect("submit");
        futs.push(fut);
    }

    let results = futures::future::join_all(futs).await;
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.expect("task settled"), json!(i));
    }

    pool.shutdown().await;

    let seen = drain_events(&mut events);
    let spawned = seen
        .iter()
        .filter(|e| e.kind == EventKind::WorkerSpawned)
        .count();
    assert!(
        (1..=2).contains(&spawned),
        "expected at most 2 workers, saw {spawned}"
    );
    // 12 tasks across 2 slots of capacity 5: at least two must have
    // overflowed into the backlog and drained back out.
    let queued = seen.iter().filter(|e| e.kind == EventKind::TaskQueued).count();
    let drained = seen
        .iter()
        .filter(|e| e.kind == EventKind::TaskDrained)
        .count();
    assert!(queued >= 2, "expected backlog traffic, saw {queued} queued");
    assert_eq!(queued, drained, "every backlogged task must drain");
}

#[tokio::test]
async fn backlog_preserves_submission_order() {
    let pool = Pool::start(worker_cfg(1));

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut joins = Vec::new();
    for i in 0..8i64 {
        let fut = pool
            .submit(vec![json!("sleep-echo"), json!(20), json!(i)])
            .await
            .expect("submit");
        let order = Arc::clone(&order);
        joins.push(tokio::spawn(async move {
            let v = fut.await.expect("task settled");
            order.lock().await.push(v.as_i64().expect("index reply"));
        }));
    }
    for j in joins {
        j.await.expect("join");
    }

    // One worker, FIFO slot queue, FIFO backlog: completion order is exactly
    // submission order.
    assert_eq!(*order.lock().await, (0..8).collect::<Vec<_>>());
    pool.shutdown().await;
}

#[tokio::test]
async fn abnormal_exit_rejects_only_the_oldest_task() {
    let pool = Pool::start(worker_cfg(1));
    let mut events = pool.events();

    let doomed = pool
        .submit(vec![json!("sleep-exit"), json!(100), json!(7)])
        .await
        .expect("submit");
    let survivor_a = pool
        .submit(vec![json!("echo"), json!("a")])
        .await
        .expect("submit");
    let survivor_b = pool
        .submit(vec![json!("echo"), json!("b")])
        .await
        .expect("submit");

    assert_eq!(doomed.await, Err(TaskError::Exited { code: 7 }));

    // The two tasks queued behind the rejected head are abandoned: their
    // futures must still be pending well after the exit. This pins the
    // documented abandonment behavior explicitly.
    assert!(timeout(Duration::from_millis(300), survivor_a).await.is_err());
    assert!(timeout(Duration::from_millis(300), survivor_b).await.is_err());

    // The dead slot is permanently out of rotation; new work grows a fresh
    // slot at the next index.
    let revived = pool
        .submit(vec![json!("echo"), json!("z")])
        .await
        .expect("submit");
    assert_eq!(revived.await, Ok(json!("z")));

    pool.shutdown().await;
    let seen = drain_events(&mut events);
    let spawned: Vec<_> = seen
        .iter()
        .filter(|e| e.kind == EventKind::WorkerSpawned)
        .map(|e| e.worker)
        .collect();
    assert_eq!(spawned, vec![Some(0), Some(1)]);
    assert!(seen
        .iter()
        .any(|e| e.kind == EventKind::WorkerExited && e.code == Some(7)));
}

#[tokio::test]
async fn handler_failure_is_a_null_reply_not_an_error() {
    let pool = Pool::start(worker_cfg(1));

    let failed = pool
        .submit(vec![json!("fail"), json!("boom")])
        .await
        .expect("submit");
    // Resolves, does not reject: failure detail only reaches stderr.
    assert_eq!(failed.await, Ok(Value::Null));

    // A handler legitimately returning null produces the identical reply —
    // the two cases are indistinguishable by design.
    let legit = pool
        .submit(vec![json!("echo"), Value::Null])
        .await
        .expect("submit");
    assert_eq!(legit.await, Ok(Value::Null));

    pool.shutdown().await;
}

#[tokio::test]
async fn idle_worker_scales_to_zero_and_is_never_reused() {
    let pool = Pool::start(worker_cfg(2));
    let mut events = pool.events();

    let first = pool
        .submit(vec![json!("echo"), json!("first")])
        .await
        .expect("submit");
    assert_eq!(first.await, Ok(json!("first")));

    // Slot queue and backlog are both empty after the reply: the worker
    // must be torn down.
    let torn_down = loop {
        match timeout(Duration::from_secs(2), events.recv()).await {
            Ok(Ok(ev)) if ev.kind == EventKind::WorkerTerminated => break ev,
            Ok(Ok(_)) => continue,
            other => panic!("no teardown observed: {other:?}"),
        }
    };
    assert_eq!(torn_down.worker, Some(0));

    let second = pool
        .submit(vec![json!("echo"), json!("second")])
        .await
        .expect("submit");
    assert_eq!(second.await, Ok(json!("second")));

    pool.shutdown().await;
    let seen = drain_events(&mut events);
    let spawned: Vec<_> = seen
        .iter()
        .filter(|e| e.kind == EventKind::WorkerSpawned)
        .map(|e| e.worker)
        .collect();
    // The tombstoned slot 0 is never reassigned; the second task got a
    // fresh slot.
    assert_eq!(spawned, vec![Some(1)]);
}

#[tokio::test]
async fn spawn_failure_rejects_the_triggering_task() {
    let pool = Pool::start(PoolConfig::new("/nonexistent/forkpool-worker"));
    let fut = pool
        .submit(vec![json!("echo"), json!(1)])
        .await
        .expect("submit");
    match fut.await {
        Err(TaskError::Spawn { .. }) => {}
        other => panic!("expected spawn rejection, got {other:?}"),
    }
    pool.shutdown().await;
}

#[tokio::test]
async fn submit_after_shutdown_is_refused() {
    let pool = Pool::start(worker_cfg(1));
    let handle = pool.handle();
    pool.shutdown().await;

    let err = handle
        .submit(vec![json!("echo"), json!(1)])
        .await
        .expect_err("pool is gone");
    assert_eq!(err, SubmitError::Closed);
}
