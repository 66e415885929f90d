//! Auto-refresh scheduling
//!
//! Drives periodic message polling on a configurable interval, counts down
//! towards the next poll once per second, and pauses the whole cycle while
//! the user is actively interacting with the dashboard.
//!
//! The scheduler only emits signals over a channel; the owning manager reacts
//! to them. Timer tasks are aborted before a replacement is spawned, so at
//! most one task per purpose is ever live.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flume::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant};
use tracing::{debug, info};

/// Signals emitted towards the manager loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSignal {
    /// The refresh interval elapsed, a poll should run now
    PollDue,
    /// One second passed, this many seconds remain until the next poll
    CountdownTick(u64),
    /// User activity suspended the refresh cycle
    PausedByActivity,
    /// The activity quiet period elapsed, polling may resume
    ResumeDue,
}

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No interval configured, nothing scheduled
    Idle,
    /// Poll and countdown timers are running
    Polling,
    /// Timers stopped until the activity quiet period elapses
    PausedByActivity,
}

pub struct AutoRefreshScheduler {
    interval_secs: u64,
    state: SyncState,
    activity_pause_enabled: bool,
    activity_delay: Duration,
    /// Seconds left until the next poll, shared with the countdown task
    remaining: Arc<AtomicU64>,
    poll_task: Option<JoinHandle<()>>,
    countdown_task: Option<JoinHandle<()>>,
    resume_task: Option<JoinHandle<()>>,
    tx: Sender<SyncSignal>,
}

impl AutoRefreshScheduler {
    pub fn new(activity_pause_enabled: bool, activity_delay_secs: u64) -> (Self, Receiver<SyncSignal>) {
        let (tx, rx) = flume::unbounded();
        let scheduler = Self {
            interval_secs: 0,
            state: SyncState::Idle,
            activity_pause_enabled,
            activity_delay: Duration::from_secs(activity_delay_secs),
            remaining: Arc::new(AtomicU64::new(0)),
            poll_task: None,
            countdown_task: None,
            resume_task: None,
            tx,
        };
        (scheduler, rx)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Reconfigure the refresh interval. Zero disables auto-refresh entirely.
    pub fn set_interval(&mut self, secs: u64) {
        self.interval_secs = secs;
        if secs == 0 {
            info!("Auto-refresh disabled");
            self.stop_all();
            self.state = SyncState::Idle;
        } else {
            info!("Auto-refresh interval set to {}s", secs);
            self.start_polling();
        }
    }

    /// (Re)start the poll and countdown timers from a full interval
    fn start_polling(&mut self) {
        self.abort_poll_timers();

        let period = Duration::from_secs(self.interval_secs);
        self.remaining.store(self.interval_secs, Ordering::SeqCst);

        let tx = self.tx.clone();
        // Capture deadlines now: the spawned task may be polled later and the
        // schedule must be anchored to the arming call, not first poll
        let first_poll = Instant::now() + period;
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_poll, period);
            loop {
                ticker.tick().await;
                if tx.send(SyncSignal::PollDue).is_err() {
                    break;
                }
            }
        }));

        let tx = self.tx.clone();
        let remaining = self.remaining.clone();
        let first_tick = Instant::now() + Duration::from_secs(1);
        self.countdown_task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, Duration::from_secs(1));
            loop {
                ticker.tick().await;
                let left = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
                    .unwrap_or(0)
                    .saturating_sub(1);
                if tx.send(SyncSignal::CountdownTick(left)).is_err() {
                    break;
                }
            }
        }));

        self.state = SyncState::Polling;
    }

    /// Call after a scheduled poll finished so the countdown restarts
    pub fn poll_completed(&mut self) {
        self.remaining.store(self.interval_secs, Ordering::SeqCst);
    }

    /// Record user activity. Pauses the cycle (when enabled) and re-arms the
    /// quiet-period timer; repeated activity keeps pushing the resume back.
    pub fn notify_activity(&mut self) {
        if !self.activity_pause_enabled || self.interval_secs == 0 {
            return;
        }

        if self.state == SyncState::Polling {
            debug!("User activity detected, pausing auto-refresh");
            self.abort_poll_timers();
            self.state = SyncState::PausedByActivity;
            let _ = self.tx.send(SyncSignal::PausedByActivity);
        }

        self.arm_resume_timer();
    }

    /// (Re)start the quiet-period timer from the current delay
    fn arm_resume_timer(&mut self) {
        if let Some(task) = self.resume_task.take() {
            task.abort();
        }
        let tx = self.tx.clone();
        let deadline = Instant::now() + self.activity_delay;
        self.resume_task = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            let _ = tx.send(SyncSignal::ResumeDue);
        }));
    }

    /// Resume polling after the quiet period, if still paused
    pub fn resume(&mut self) {
        if self.state == SyncState::PausedByActivity && self.interval_secs > 0 {
            debug!("Activity quiet period elapsed, resuming auto-refresh");
            self.start_polling();
        }
    }

    pub fn activity_pause_enabled(&self) -> bool {
        self.activity_pause_enabled
    }

    pub fn set_activity_pause(&mut self, enabled: bool) {
        self.activity_pause_enabled = enabled;
        if !enabled && self.state == SyncState::PausedByActivity {
            // No quiet period anymore, go straight back to polling
            if let Some(task) = self.resume_task.take() {
                task.abort();
            }
            self.start_polling();
        }
    }

    pub fn set_activity_delay(&mut self, secs: u64) {
        self.activity_delay = Duration::from_secs(secs);
        // A quiet period already running restarts with the new delay
        if self.resume_task.is_some() {
            self.arm_resume_timer();
        }
    }

    fn abort_poll_timers(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        if let Some(task) = self.countdown_task.take() {
            task.abort();
        }
    }

    /// Stop every timer, including a pending resume
    pub fn stop_all(&mut self) {
        self.abort_poll_timers();
        if let Some(task) = self.resume_task.take() {
            task.abort();
        }
        self.remaining.store(0, Ordering::SeqCst);
    }
}

impl Drop for AutoRefreshScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}
