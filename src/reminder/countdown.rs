//! Countdown state machine
//!
//! Idle -> Running -> Expired -> Idle. The remaining time is always derived
//! from the deadline and the current wall clock, so a process that was
//! suspended reads the right value on its next tick.

use crate::core::{Clock, CountdownState, MIN_COUNTDOWN_MS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a countdown currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownPhase {
    Idle,
    Running,
    Expired,
}

/// Countdown length for `minutes`, never shorter than one minute
pub fn countdown_duration_ms(minutes: f64) -> u64 {
    let requested = (minutes * 60_000.0).round();
    if !requested.is_finite() || requested <= MIN_COUNTDOWN_MS as f64 {
        return MIN_COUNTDOWN_MS;
    }
    // Saturating float-to-int cast caps absurd inputs at u64::MAX
    requested as u64
}

impl CountdownState {
    /// Running state for a countdown of `minutes` starting at `now_ms`
    pub fn started(now_ms: u64, minutes: f64) -> Self {
        let ends_at_ms = now_ms.saturating_add(countdown_duration_ms(minutes));
        Self {
            ends_at_ms: Some(ends_at_ms),
            remaining_ms: ends_at_ms - now_ms,
        }
    }

    /// Recompute the remaining time against `now_ms`
    pub fn tick(&self, now_ms: u64) -> Self {
        match self.ends_at_ms {
            Some(ends_at_ms) => Self {
                ends_at_ms: Some(ends_at_ms),
                remaining_ms: ends_at_ms.saturating_sub(now_ms),
            },
            None => Self::default(),
        }
    }

    pub fn phase(&self) -> CountdownPhase {
        match self.ends_at_ms {
            None => CountdownPhase::Idle,
            Some(_) if self.remaining_ms == 0 => CountdownPhase::Expired,
            Some(_) => CountdownPhase::Running,
        }
    }
}

/// Countdown bound to a clock
///
/// Holds no thread or timer of its own; something else calls
/// [`CountdownTimer::tick`] periodically.
#[derive(Debug, Clone)]
pub struct CountdownTimer<C> {
    clock: C,
    state: CountdownState,
}

impl<C: Clock> CountdownTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: CountdownState::default(),
        }
    }

    /// Resume from a state saved earlier, recomputed against the clock
    pub fn restore(clock: C, state: CountdownState) -> Self {
        let state = state.tick(clock.now_ms());
        Self { clock, state }
    }

    pub fn start(&mut self, minutes: f64) -> CountdownState {
        self.state = CountdownState::started(self.clock.now_ms(), minutes);
        debug!(
            ends_at_ms = ?self.state.ends_at_ms,
            remaining_ms = self.state.remaining_ms,
            "countdown started"
        );
        self.state
    }

    pub fn tick(&mut self) -> CountdownState {
        self.state = self.state.tick(self.clock.now_ms());
        self.state
    }

    pub fn clear(&mut self) -> CountdownState {
        if self.state.ends_at_ms.is_some() {
            debug!("countdown cleared");
        }
        self.state = CountdownState::default();
        self.state
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn phase(&self) -> CountdownPhase {
        self.state.phase()
    }
}

/// Remaining time as `MM:SS`, rounding partial seconds up
///
/// Minutes are not capped at 59 or 99.
pub fn format_remaining(ms: u64) -> String {
    let seconds = ms.div_ceil(1000);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
