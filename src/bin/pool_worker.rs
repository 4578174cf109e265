//! Reference worker for the forkpool demos and integration tests.
//!
//! Dispatches on the first argument:
//! - `["echo", v]` — reply with `v`
//! - `["sleep-echo", ms, v]` — reply with `v` after `ms` milliseconds
//! - `["fail", v]` — fail the handler (parent sees the `null` sentinel)
//! - `["exit", code]` — terminate the process immediately with `code`
//! - `["sleep-exit", ms, code]` — terminate with `code` after `ms` ms

use std::time::Duration;

use serde_json::Value;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    forkpool::adapter::serve(dispatch).await
}

async fn dispatch(args: Vec<Value>) -> Result<Value, String> {
    let op = args.first().and_then(Value::as_str).unwrap_or("echo");
    match op {
        "echo" => Ok(args.get(1).cloned().unwrap_or(Value::Null)),
        "sleep-echo" => {
            let ms = args.get(1).and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(args.get(2).cloned().unwrap_or(Value::Null))
        }
        "fail" => Err(format!("induced failure: {:?}", args.get(1))),
        "exit" => {
            let code = args.get(1).and_then(Value::as_i64).unwrap_or(1);
            std::process::exit(code as i32);
        }
        "sleep-exit" => {
            let ms = args.get(1).and_then(Value::as_u64).unwrap_or(0);
            let code = args.get(2).and_then(Value::as_i64).unwrap_or(1);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            std::process::exit(code as i32);
        }
        other => Err(format!("unknown op '{other}'")),
    }
}
