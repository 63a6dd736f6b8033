//! # Example: basic_delay
//!
//! Minimal example: schedule two actions, await one, inspect the other without blocking.
//!
//! Demonstrates how to:
//! - Schedule a value-returning action with [`Timer::run_after`].
//! - Convert an `(amount, unit)` pair with [`TimeUnit::duration`].
//! - Await a handle and read its status, result and failure.
//!
//! ## Flow
//! ```text
//! Timer::run_after(action, 200ms)
//!     ├─► publish(TaskScheduled)
//!     ├─► engine sleeps 200ms
//!     ├─► publish(TaskStarting)
//!     ├─► action() ──► Ok(42)
//!     └─► publish(TaskSucceeded), handle.wait() returns 42
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_delay
//! ```

use std::time::Duration;

use anyhow::Context;
use timervisor::{TimeUnit, Timer, WaitError};

#[derive(Debug)]
struct Overheated(u32);

impl std::fmt::Display for Overheated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sensor overheated at {}C", self.0)
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Timer on the current runtime, default config
    let timer = Timer::new().context("building timer")?;

    // 2. An action that produces a value after 200ms
    let answer = timer.run_after(
        || {
            println!("[answer] computing");
            Ok::<_, Overheated>(42)
        },
        TimeUnit::Milliseconds.duration(200),
    );
    println!("[main] scheduled {} status={}", answer.id(), answer.status());

    // 3. An action that fails with its declared error
    let sensor = timer.run_after(|| Err::<u32, _>(Overheated(97)), Duration::from_millis(50));

    // 4. Await the value
    let value = answer.wait().await?;
    println!("[main] {} -> {value} status={}", answer.id(), answer.status());

    // 5. Await the failure and look at it again without blocking
    match sensor.wait().await {
        Err(WaitError::Failed(e)) => println!("[main] {} failed: {e}", sensor.id()),
        other => println!("[main] unexpected outcome: {other:?}"),
    }
    if let Ok(failure) = sensor.exception() {
        println!("[main] exception() = {failure} status={}", sensor.status());
    }

    timer.shutdown().await;
    Ok(())
}
