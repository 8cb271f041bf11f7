//! Elapsed-time counter shown while punched in
//!
//! The counter is recomputed from the punch-in instant on every tick rather
//! than incremented, so it never drifts from the wall clock.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Source of device-local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Clock reading the system time in the local timezone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Whole seconds between `since` and `now`, never negative
pub fn elapsed_between(since: NaiveDateTime, now: NaiveDateTime) -> u64 {
    u64::try_from((now - since).num_seconds()).unwrap_or(0)
}

/// Render seconds as `HH:MM:SS`
pub fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Counter ticking once per second from a punch-in instant
///
/// The ticking task is aborted on `stop`, on restart and on drop.
pub struct ElapsedTimer {
    clock: Arc<dyn Clock>,
    elapsed: Arc<AtomicU64>,
    since: Option<NaiveDateTime>,
    task: Option<JoinHandle<()>>,
}

impl ElapsedTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            elapsed: Arc::new(AtomicU64::new(0)),
            since: None,
            task: None,
        }
    }

    /// Start (or restart) counting from `since`; must run inside a tokio
    /// runtime
    pub fn start(&mut self, since: NaiveDateTime) {
        self.cancel();

        let clock = Arc::clone(&self.clock);
        let elapsed = Arc::clone(&self.elapsed);
        elapsed.store(elapsed_between(since, clock.now()), Ordering::Relaxed);

        self.since = Some(since);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                elapsed.store(elapsed_between(since, clock.now()), Ordering::Relaxed);
            }
        }));

        debug!("Elapsed timer started from {}", since);
    }

    /// Stop counting and reset to zero
    pub fn stop(&mut self) {
        self.cancel();
        self.since = None;
        self.elapsed.store(0, Ordering::Relaxed);
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Elapsed timer cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn since(&self) -> Option<NaiveDateTime> {
        self.since
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    pub fn display(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
