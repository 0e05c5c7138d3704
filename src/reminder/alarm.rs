//! Expiry scheduling and alerts
//!
//! [`ExpiryWatcher`] is the periodic scheduler for a [`CountdownTimer`]. It
//! stops ticking on the first expiry it observes, which is what keeps the
//! alert from firing twice. Notification and tone are best effort; their
//! failures are logged and never change the countdown state.

use crate::core::{Clock, CountdownState};
use crate::reminder::countdown::{CountdownPhase, CountdownTimer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Title of the expiry notification
pub const EXPIRY_TITLE: &str = "Parking meter";
/// Body of the expiry notification
pub const EXPIRY_BODY: &str = "Your parking time is up";

/// Default scheduler cadence (ms)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

/// Failures of the alert side effects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlertError {
    #[error("Notification permission denied")]
    PermissionDenied,
    #[error("Tone playback failed: {0}")]
    Playback(String),
}

/// Notification and audible tone raised when the countdown expires
#[async_trait]
pub trait AlertSink: Send {
    async fn notify(&mut self, title: &str, body: &str) -> Result<(), AlertError>;

    async fn play_tone(&mut self) -> Result<(), AlertError>;
}

/// Alert sink that counts calls and can be told to fail
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertSink {
    notifications: Arc<AtomicUsize>,
    tones: Arc<AtomicUsize>,
    failing: bool,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call records itself and then fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn tones(&self) -> usize {
        self.tones.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn notify(&mut self, _title: &str, _body: &str) -> Result<(), AlertError> {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AlertError::PermissionDenied);
        }
        Ok(())
    }

    async fn play_tone(&mut self) -> Result<(), AlertError> {
        self.tones.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AlertError::Playback("audio device unavailable".to_string()));
        }
        Ok(())
    }
}

/// Ticks a countdown on the tokio clock and alerts once on expiry
pub struct ExpiryWatcher<C> {
    timer: CountdownTimer<C>,
    tick_interval: Duration,
    alerted: bool,
}

impl<C: Clock> ExpiryWatcher<C> {
    pub fn new(timer: CountdownTimer<C>) -> Self {
        Self::with_interval(timer, Duration::from_millis(DEFAULT_TICK_INTERVAL_MS))
    }

    pub fn with_interval(timer: CountdownTimer<C>, tick_interval: Duration) -> Self {
        Self {
            timer,
            tick_interval,
            alerted: false,
        }
    }

    pub fn start(&mut self, minutes: f64) -> CountdownState {
        self.alerted = false;
        self.timer.start(minutes)
    }

    pub fn clear(&mut self) -> CountdownState {
        self.alerted = false;
        self.timer.clear()
    }

    pub fn timer(&self) -> &CountdownTimer<C> {
        &self.timer
    }

    /// Tick until the countdown expires or is idle
    ///
    /// Dropping the returned future stops ticking.
    pub async fn run(&mut self, alerts: &mut dyn AlertSink) -> CountdownState {
        self.run_with(alerts, |_| {}).await
    }

    /// Like [`ExpiryWatcher::run`], handing every tick's state to `on_tick`
    pub async fn run_with<F>(&mut self, alerts: &mut dyn AlertSink, mut on_tick: F) -> CountdownState
    where
        F: FnMut(&CountdownState),
    {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let state = self.timer.tick();
            on_tick(&state);

            match state.phase() {
                CountdownPhase::Running => continue,
                CountdownPhase::Idle => {
                    debug!("countdown idle, nothing to watch");
                    return state;
                }
                CountdownPhase::Expired => {
                    if !self.alerted {
                        self.alerted = true;
                        info!(ends_at_ms = ?state.ends_at_ms, "countdown expired");
                        raise(alerts).await;
                    }
                    return state;
                }
            }
        }
    }
}

async fn raise(alerts: &mut dyn AlertSink) {
    if let Err(error) = alerts.notify(EXPIRY_TITLE, EXPIRY_BODY).await {
        warn!(%error, "expiry notification failed");
    }
    if let Err(error) = alerts.play_tone().await {
        warn!(%error, "expiry tone failed");
    }
}
