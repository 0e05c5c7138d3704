//! Core data types for position, heading and reminder state

use crate::core::constants::UNKNOWN_ACCURACY_M;
use serde::{Deserialize, Serialize};

/// Geographic point in decimal degrees
///
/// Valid inputs are `lat` in [-90, 90] and `lon` in [-180, 180]. The geo
/// functions do not enforce this; use [`GeoPoint::is_valid`] at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that both coordinates are finite and inside WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Single reading delivered by a geolocation stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub point: GeoPoint,
    /// Reported error radius in meters, smaller is better
    pub accuracy_m: Option<f64>,
    /// Capture time, milliseconds since the Unix epoch
    pub captured_at_ms: u64,
}

impl PositionSample {
    pub fn new(point: GeoPoint, accuracy_m: Option<f64>, captured_at_ms: u64) -> Self {
        Self {
            point,
            accuracy_m,
            captured_at_ms,
        }
    }

    /// Accuracy used for ranking; unknown or nonsensical values rank last
    pub fn effective_accuracy_m(&self) -> f64 {
        match self.accuracy_m {
            Some(accuracy) if accuracy.is_finite() && accuracy >= 0.0 => accuracy,
            _ => UNKNOWN_ACCURACY_M,
        }
    }

    /// True when this sample is strictly more accurate than `other`
    pub fn is_better_than(&self, other: &PositionSample) -> bool {
        self.effective_accuracy_m() < other.effective_accuracy_m()
    }
}

/// Heading output for one orientation tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingReading {
    /// Degrees clockwise from North in [0, 360), `None` when this tick had no usable value
    pub degrees: Option<f64>,
    /// Sensor is gated behind a permission that has not been granted
    pub permission_needed: bool,
    pub error: Option<String>,
}

impl HeadingReading {
    pub fn heading(degrees: f64) -> Self {
        Self {
            degrees: Some(degrees),
            permission_needed: false,
            error: None,
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            degrees: None,
            permission_needed: false,
            error: Some(error.into()),
        }
    }

    pub fn with_permission_needed(mut self, needed: bool) -> Self {
        self.permission_needed = needed;
        self
    }
}

/// Countdown window for the parking-meter reminder
///
/// `ends_at_ms == None` is the idle state. While set, `remaining_ms` is
/// always recomputed from the clock, never decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountdownState {
    pub ends_at_ms: Option<u64>,
    pub remaining_ms: u64,
}
