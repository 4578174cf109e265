//! Submits a burst of tasks to the reference worker and logs pool events.
//!
//! ```bash
//! cargo build --bin pool_worker
//! cargo run --example burst --features logging -- target/debug/pool_worker
//! ```

use std::sync::Arc;

use serde_json::json;

use forkpool::{LogWriter, Pool, PoolConfig, Subscribe};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let program = std::env::args()
        .nth(1)
        .ok_or("usage: burst <path-to-pool_worker>")?;

    let mut cfg = PoolConfig::new(program);
    cfg.max_workers = 2;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let pool = Pool::with_subscribers(cfg, subs);

    let mut futs = Vec::new();
    for i in 0..12 {
        futs.push(
            pool.submit(vec![json!("sleep-echo"), json!(50), json!(i)])
                .await?,
        );
    }

    for (i, fut) in futs.into_iter().enumerate() {
        let reply = fut.await?;
        println!("task {i} -> {reply}");
    }

    pool.shutdown().await;
    Ok(())
}
