//! # Example: cancel_before_start
//!
//! Demonstrates cancelling a task while it is still pending, and what cancelling a running
//! task does (nothing).
//!
//! Shows how to:
//! - Attach the built-in [`LogWriter`] subscriber
//! - Cancel a pending task with [`TaskHandle::cancel`]
//! - Observe that `wait` and `result` report `"task was cancelled"`
//!
//! ## Flow
//! ```text
//! run_after(action, 10s) ──► cancel() == true ──► status Cancelled, action never runs
//! run_after(action, 0s)  ──► action starts   ──► cancel() == false ──► wait() == 7
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=timervisor=debug cargo run --example cancel_before_start --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use timervisor::{LogWriter, Subscribe, TaskStatus, Timer, TimerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timervisor=debug")),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let timer = Timer::builder(TimerConfig::default())
        .with_subscribers(subs)
        .build()?;

    // 1. Cancel while pending: the action never runs
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let late = timer.run_after(
        move || {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, std::io::Error>("too late")
        },
        Duration::from_secs(10),
    );

    println!("[main] cancel pending -> {}", late.cancel());
    println!("[main] cancel again   -> {}", late.cancel());
    println!("[main] status={} wait={:?}", late.status(), late.wait().await);
    assert_eq!(late.status(), TaskStatus::Cancelled);

    // 2. Cancel while running: refused, the action finishes normally
    let started = Arc::new(AtomicBool::new(false));
    let signal = Arc::clone(&started);
    let busy = timer.run_after(
        move || {
            signal.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            Ok::<_, std::io::Error>(7)
        },
        Duration::ZERO,
    );
    while !started.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    println!("[main] cancel running -> {}", busy.cancel());
    println!("[main] wait -> {:?} status={}", busy.wait().await, busy.status());

    println!("[main] pending action ran: {}", ran.load(Ordering::SeqCst));
    timer.shutdown().await;
    Ok(())
}
