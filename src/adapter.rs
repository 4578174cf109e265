//! # Worker-side adapter.
//!
//! Runs inside each worker process: receives one task's arguments per stdin
//! line, applies them to the registered handler, and replies on stdout.
//!
//! ## Wire contract
//! ```text
//! parent ──► worker : one JSON array per line (the submitted args)
//! worker ──► parent : one JSON value per line (the handler's result)
//!                     `null` = "no result" sentinel on handler failure
//! ```
//!
//! ## Rules
//! - Replies are written strictly in the order tasks arrive — the parent
//!   correlates replies positionally, so a worker must never reorder them.
//! - A handler failure is reported to the parent only as the `null`
//!   sentinel; the failure detail is logged to **stderr** (inherited from
//!   the parent) and reaches no caller. A handler that legitimately returns
//!   `null` is therefore indistinguishable from a failed one.
//! - Malformed input lines get the same treatment as handler failures:
//!   sentinel reply plus stderr log, never a crash.
//!
//! ## Example
//! ```no_run
//! use serde_json::{json, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::io::Result<()> {
//!     forkpool::adapter::serve(|args: Vec<Value>| async move {
//!         let n = args.first().and_then(Value::as_i64).unwrap_or(0);
//!         Ok::<_, String>(json!(n * 2))
//!     })
//!     .await
//! }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Serves tasks from stdin until the parent closes the pipe.
///
/// Applies `handler` to each received argument list, sequentially and in
/// order. Returns when stdin reaches EOF (the parent tore the worker down
/// or shut the pool down) or when the stdio pipes fail.
pub async fn serve<H, Fut, E>(handler: H) -> io::Result<()>
where
    H: Fn(Vec<Value>) -> Fut,
    Fut: Future<Output = Result<Value, E>>,
    E: Display,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<Vec<Value>>(&line) {
            Ok(args) => match handler(args.clone()).await {
                Ok(value) => value,
                Err(err) => {
                    eprintln!("[forkpool-worker] handler failed: args={args:?} err={err}");
                    Value::Null
                }
            },
            Err(err) => {
                eprintln!("[forkpool-worker] malformed task line: {err}");
                Value::Null
            }
        };

        let mut buf = serde_json::to_vec(&reply).map_err(io::Error::other)?;
        buf.push(b'\n');
        stdout.write_all(&buf).await?;
        stdout.flush().await?;
    }

    Ok(())
}
