//! Parking-meter reminder
//!
//! A countdown state machine plus the scheduler that ticks it and raises the
//! alert once on expiry.

pub mod countdown;
pub mod alarm;

pub use countdown::{format_remaining, CountdownPhase, CountdownTimer};
pub use alarm::{AlertError, AlertSink, ExpiryWatcher, RecordingAlertSink};
