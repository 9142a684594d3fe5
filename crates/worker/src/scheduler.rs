//! Fixed-interval cycle scheduler.
//!
//! One spawned task runs the cycle, then sleeps for whatever is left of the
//! interval. An overrun starts the next cycle immediately. Errors and panics
//! inside a cycle are logged and never end the loop; only [`Scheduler::stop`]
//! does. The sleep races the cancellation token, so stopping takes effect
//! without waiting out the interval.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

/// Lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started, or waiting between cycles.
    Idle,
    /// A cycle is executing.
    Running,
    /// Stopped for good.
    Stopped,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Running,
            2 => SchedulerState::Stopped,
            _ => SchedulerState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SchedulerState::Idle => 0,
            SchedulerState::Running => 1,
            SchedulerState::Stopped => 2,
        }
    }
}

/// Handle to the background cycle loop. Clones share the same loop.
#[derive(Debug, Clone)]
pub struct Scheduler {
    cancel: CancellationToken,
    state: Arc<AtomicU8>,
    started: Arc<AtomicBool>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            state: Arc::new(AtomicU8::new(SchedulerState::Idle.as_u8())),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Spawn the loop. A scheduler can be started once.
    pub fn start<F, Fut, E>(
        &self,
        interval: Duration,
        mut cycle: F,
    ) -> Result<JoinHandle<()>, EngineError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::Setup("scheduler already started".into()));
        }

        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);

        tracing::info!(interval_secs = interval.as_secs(), "Scheduler started");

        Ok(tokio::spawn(async move {
            let mut iteration: u64 = 0;
            while !cancel.is_cancelled() {
                iteration += 1;
                let started_at = Instant::now();
                set_state(&state, SchedulerState::Running);

                match AssertUnwindSafe(cycle()).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!(iteration, error = %e, "Cycle failed"),
                    Err(_) => tracing::error!(iteration, "Cycle panicked"),
                }

                let elapsed = started_at.elapsed();
                if elapsed >= interval {
                    tracing::warn!(
                        iteration,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Cycle overran its interval, starting next immediately"
                    );
                }

                if cancel.is_cancelled() {
                    break;
                }
                set_state(&state, SchedulerState::Idle);

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval.saturating_sub(elapsed)) => {}
                }
            }

            set_state(&state, SchedulerState::Stopped);
            tracing::info!(iterations = iteration, "Scheduler stopped");
        }))
    }

    /// Stop the loop. Safe to call repeatedly and from any task; a cycle in
    /// progress finishes before the loop exits.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Scheduler stop requested");
        }
        self.cancel.cancel();
        if !self.started.load(Ordering::SeqCst) {
            set_state(&self.state, SchedulerState::Stopped);
        }
    }
}

fn set_state(state: &AtomicU8, value: SchedulerState) {
    state.store(value.as_u8(), Ordering::SeqCst);
}
