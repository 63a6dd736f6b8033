//! End-to-end behaviour of `Timer::run_after` and the handles it returns.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use timervisor::{TaskFailure, TaskStateError, TaskStatus, Timer, TimerConfig, WaitError};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug, PartialEq)]
struct MyErr(&'static str);

impl fmt::Display for MyErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl StdError for MyErr {}

fn timer() -> Timer {
    Timer::new().expect("tests run inside a tokio runtime")
}

#[tokio::test(flavor = "multi_thread")]
async fn happy_path_reports_value_everywhere() {
    let timer = timer();
    let h = timer.run_after(|| Ok::<_, MyErr>(42), Duration::from_millis(10));

    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.wait().await.ok(), Some(42));
    assert_eq!(h.status(), TaskStatus::Success);
    assert_eq!(h.result(), Ok(42));
    assert_eq!(
        h.exception().unwrap_err().message(),
        "task completed with a result"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_surfaces_declared_error() {
    let timer = timer();
    let h = timer.run_after(|| Err::<u32, _>(MyErr("boom")), Duration::from_millis(10));

    sleep(Duration::from_millis(50)).await;
    let _ = h.wait().await;
    assert_eq!(h.status(), TaskStatus::Failed);

    let failure = h.exception().expect("failed task has an exception");
    assert_eq!(failure.to_string(), "boom");
    assert_eq!(failure.error(), Some(&MyErr("boom")));
    assert_eq!(
        h.result().unwrap_err().message(),
        "task completed with an error"
    );

    match h.wait().await {
        Err(WaitError::Failed(e)) => assert_eq!(*e, MyErr("boom")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_before_start_never_runs_action() {
    let timer = timer();
    let touched = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&touched);
    let h = timer.run_after(
        move || {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, MyErr>(())
        },
        Duration::from_secs(1),
    );

    sleep(Duration::from_millis(10)).await;
    assert!(h.cancel());
    assert!(!h.cancel());
    assert_eq!(h.status(), TaskStatus::Cancelled);

    let err = h.wait().await.unwrap_err();
    assert_eq!(err.as_state().map(TaskStateError::message), Some("task was cancelled"));
    assert_eq!(h.result().unwrap_err().message(), "task was cancelled");
    assert_eq!(h.exception().unwrap_err().message(), "task was cancelled");

    sleep(Duration::from_millis(50)).await;
    assert!(!touched.load(Ordering::SeqCst));
    assert_eq!(h.status(), TaskStatus::Cancelled);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_after_start_is_refused() {
    let timer = timer();
    let h = timer.run_after(
        || {
            std::thread::sleep(Duration::from_millis(200));
            Ok::<_, MyErr>(7)
        },
        Duration::from_millis(10),
    );

    sleep(Duration::from_millis(100)).await;
    assert_eq!(h.status(), TaskStatus::Running);
    assert!(!h.cancel());
    assert_eq!(h.wait().await.ok(), Some(7));
    assert_eq!(h.status(), TaskStatus::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn state_error_from_action_stays_wrapped() {
    let timer = timer();
    let h = timer.run_after(
        || Err::<u32, _>(TaskStateError::new("user")),
        Duration::from_millis(10),
    );

    match h.wait().await {
        Err(WaitError::Wrapped(w)) => {
            let cause = w.cause().error().expect("user error");
            assert_eq!(cause.message(), "user");
        }
        other => panic!("expected wrapped state error, got {other:?}"),
    }
    assert_eq!(h.status(), TaskStatus::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn boxed_state_error_from_action_stays_wrapped() {
    let timer = timer();
    let h = timer.run_after(
        || -> Result<u32, Box<dyn StdError + Send + Sync>> {
            Err(Box::new(TaskStateError::new("user")))
        },
        Duration::ZERO,
    );
    assert!(matches!(h.wait().await, Err(WaitError::Wrapped(_))));
}

#[test]
fn double_wait_from_two_threads_runs_action_once() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let timer = Timer::builder(TimerConfig::default())
        .with_runtime(rt.handle().clone())
        .build()
        .expect("explicit runtime");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let h = timer.run_after(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, MyErr>(String::from("shared"))
        },
        Duration::from_millis(20),
    );

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| h.wait_blocking());
        let b = s.spawn(|| h.wait_blocking());
        (a.join().expect("waiter a"), b.join().expect("waiter b"))
    });

    assert_eq!(a.ok().as_deref(), Some("shared"));
    assert_eq!(b.ok().as_deref(), Some("shared"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_failure_waits_share_cause() {
    let timer = timer();
    let h = timer.run_after(|| Err::<u32, _>(MyErr("same")), Duration::ZERO);

    let first = h.wait().await.unwrap_err();
    let second = h.wait().await.unwrap_err();
    match (first, second) {
        (WaitError::Failed(a), WaitError::Failed(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_and_large_delays() {
    let timer = timer();

    let now = timer.run_after(|| Ok::<_, MyErr>(1), Duration::ZERO);
    assert_eq!(now.wait().await.ok(), Some(1));

    let never = timer.run_after(|| Ok::<_, MyErr>(2), Duration::from_secs(365 * 24 * 3600));
    assert_eq!(never.status(), TaskStatus::Pending);
    assert!(never.cancel());
    assert_eq!(never.status(), TaskStatus::Cancelled);

    let huge = timer.run_after(|| Ok::<_, MyErr>(3), Duration::MAX);
    assert_eq!(huge.status(), TaskStatus::Pending);
    assert!(huge.cancel());
}

#[tokio::test(flavor = "multi_thread")]
async fn interrupted_wait_keeps_interrupt_set() {
    let timer = timer();
    let h = timer.run_after(|| Ok::<_, MyErr>(5), Duration::from_secs(60));

    let interrupt = CancellationToken::new();
    let trigger = interrupt.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = h.wait_interruptible(&interrupt).await.unwrap_err();
    assert_eq!(err.as_state().map(TaskStateError::message), Some("task was interrupted"));
    assert!(interrupt.is_cancelled());
    assert_eq!(h.status(), TaskStatus::Pending);
    assert!(h.cancel());
}

#[tokio::test(flavor = "multi_thread")]
async fn panic_in_action_is_reported() {
    let timer = timer();
    let h = timer.run_after(
        || -> Result<u32, MyErr> { panic!("kaboom") },
        Duration::ZERO,
    );

    match h.wait().await {
        Err(WaitError::Panicked(msg)) => assert_eq!(&*msg, "kaboom"),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(h.status(), TaskStatus::Failed);
    assert!(matches!(h.exception(), Ok(TaskFailure::Panic(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_phase_queries_do_not_block() {
    let timer = timer();
    let h = timer.run_after(|| Ok::<_, MyErr>(1), Duration::from_secs(60));

    assert_eq!(h.result().unwrap_err().message(), "task has not completed");
    assert_eq!(h.exception().unwrap_err().message(), "task has not completed");
    assert!(h.cancel());
}

#[tokio::test(flavor = "multi_thread")]
async fn status_never_regresses_while_polling() {
    let timer = timer();
    let h = timer.run_after(
        || {
            std::thread::sleep(Duration::from_millis(30));
            Ok::<_, MyErr>(())
        },
        Duration::from_millis(10),
    );

    let mut prev = h.status();
    while !prev.is_terminal() {
        let next = h.status();
        assert!(prev.can_advance_to(next), "{prev} -> {next}");
        if next == TaskStatus::Success {
            assert!(h.result().is_ok());
        }
        prev = next;
        tokio::task::yield_now().await;
    }
    assert_eq!(prev, TaskStatus::Success);
    assert!(h.exception().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn inline_engine_behaves_like_blocking_pool() {
    let cfg = TimerConfig {
        blocking_actions: false,
        ..TimerConfig::default()
    };
    let timer = Timer::builder(cfg).build().expect("runtime");
    let h = timer.run_after(|| Ok::<_, MyErr>("inline"), Duration::from_millis(5));
    assert_eq!(h.wait().await.ok(), Some("inline"));
    assert_eq!(h.status(), TaskStatus::Success);
}

fn idle_timer() -> (tokio::runtime::Runtime, Timer) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let timer = Timer::builder(TimerConfig::default())
        .with_runtime(rt.handle().clone())
        .build()
        .expect("explicit runtime");
    (rt, timer)
}

fn assert_abandoned<R>(h: &timervisor::TaskHandle<R, MyErr>)
where
    R: Clone + Send + Sync + fmt::Debug + 'static,
{
    let err = h.wait_blocking().unwrap_err();
    assert_eq!(err.as_state().map(TaskStateError::message), Some("task was cancelled"));
    assert_eq!(h.status(), TaskStatus::Cancelled);
}

#[test]
fn runtime_dropped_before_first_poll_cancels_task() {
    let (rt, timer) = idle_timer();
    let h = timer.run_after(|| Ok::<_, MyErr>(1), Duration::from_millis(50));
    assert_eq!(h.status(), TaskStatus::Pending);

    drop(rt);
    assert_abandoned(&h);
}

#[test]
fn runtime_dropped_while_sleeping_cancels_task() {
    let (rt, timer) = idle_timer();
    let h = timer.run_after(|| Ok::<_, MyErr>(1), Duration::from_secs(60));
    rt.block_on(async { sleep(Duration::from_millis(10)).await });
    assert_eq!(h.status(), TaskStatus::Pending);

    drop(rt);
    assert_abandoned(&h);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_racing_start_is_all_or_nothing() {
    let timer = timer();
    let (mut won, mut lost) = (0, 0);

    for _ in 0..500 {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let h = timer.run_after(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MyErr>(())
            },
            Duration::ZERO,
        );

        let before = h.status();
        let cancelled = h.cancel();
        let after = h.status();
        assert!(before.can_advance_to(after), "{before} -> {after}");

        let outcome = h.wait().await;
        let settled = h.status();
        assert!(after.can_advance_to(settled), "{after} -> {settled}");

        if cancelled {
            won += 1;
            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert_eq!(settled, TaskStatus::Cancelled);
            let err = outcome.unwrap_err();
            assert_eq!(err.as_state().map(TaskStateError::message), Some("task was cancelled"));
        } else {
            lost += 1;
            assert!(outcome.is_ok());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(settled, TaskStatus::Success);
        }
    }
    assert_eq!(won + lost, 500);
}
