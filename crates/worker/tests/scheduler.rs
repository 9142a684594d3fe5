use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use proxwatch_worker::{EngineError, Scheduler, SchedulerState};
use tokio::time::Instant;

#[tokio::test]
async fn failing_cycle_does_not_stop_the_loop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let scheduler = Scheduler::new();

    let counter = calls.clone();
    let handle = scheduler
        .start(Duration::from_millis(20), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("first cycle fails".to_string())
                } else {
                    Ok(())
                }
            }
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert_ne!(scheduler.state(), SchedulerState::Stopped);
    assert!(!handle.is_finished());

    scheduler.stop();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop should exit promptly")
        .unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[tokio::test]
async fn panicking_cycle_is_contained() {
    let calls = Arc::new(AtomicUsize::new(0));
    let scheduler = Scheduler::new();

    let counter = calls.clone();
    let handle = scheduler
        .start(Duration::from_millis(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    panic!("cycle blew up");
                }
                Ok::<(), String>(())
            }
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);

    scheduler.stop();
    handle.await.unwrap();
}

#[tokio::test]
async fn stop_interrupts_a_long_sleep() {
    let calls = Arc::new(AtomicUsize::new(0));
    let scheduler = Scheduler::new();

    let counter = calls.clone();
    let handle = scheduler
        .start(Duration::from_secs(3600), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<(), String>(()) }
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    let remote = scheduler.clone();
    tokio::spawn(async move { remote.stop() }).await.unwrap();

    tokio::time::timeout(Duration::from_millis(500), handle)
        .await
        .expect("stop should not wait out the interval")
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_is_idempotent_and_start_is_single_use() {
    let scheduler = Scheduler::new();
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    let handle = scheduler
        .start(Duration::from_millis(10), || async { Ok::<(), String>(()) })
        .unwrap();
    assert_matches!(
        scheduler.start(Duration::from_millis(10), || async { Ok::<(), String>(()) }),
        Err(EngineError::Setup(_))
    );

    scheduler.stop();
    scheduler.stop();
    handle.await.unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[tokio::test]
async fn stopping_before_start_is_terminal() {
    let scheduler = Scheduler::new();
    scheduler.stop();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

fn assert_offset_ms(actual: Duration, expected_ms: u64) {
    let actual_ms = actual.as_millis() as u64;
    assert!(
        actual_ms.abs_diff(expected_ms) <= 2,
        "cycle started at {actual_ms}ms, expected {expected_ms}ms"
    );
}

/// A 150ms cycle overruns the 100ms interval and the next one starts at once;
/// a 40ms cycle is followed by only the remaining 60ms of sleep.
#[tokio::test(start_paused = true)]
async fn sleep_accounts_for_cycle_duration_and_overruns_do_not_burst() {
    let starts = Arc::new(Mutex::new(Vec::new()));
    let durations = [150u64, 40, 0, 0];
    let calls = Arc::new(AtomicUsize::new(0));
    let scheduler = Scheduler::new();
    let base = Instant::now();

    let recorded = starts.clone();
    let counter = calls.clone();
    let handle = scheduler
        .start(Duration::from_millis(100), move || {
            recorded.lock().unwrap().push(Instant::now());
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let busy = Duration::from_millis(durations.get(n).copied().unwrap_or(0));
            async move {
                tokio::time::sleep(busy).await;
                Ok::<(), String>(())
            }
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(360)).await;
    scheduler.stop();
    handle.await.unwrap();

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 4, "expected four cycles within 360ms");
    for (start, expected_ms) in starts.iter().zip([0, 150, 250, 350]) {
        assert_offset_ms(*start - base, expected_ms);
    }
}
