//! Physical constants and system parameters

/// Mean Earth radius used by the spherical model (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Accuracy assumed for samples that report none (m)
pub const UNKNOWN_ACCURACY_M: f64 = f64::MAX;

/// Distance at which formatting switches from meters to kilometers
pub const KILOMETER_THRESHOLD_M: f64 = 1000.0;

/// Status text for an orientation event without any usable field
pub const NO_HEADING_DATA: &str = "No heading data";

/// Shortest countdown accepted by the reminder (ms)
pub const MIN_COUNTDOWN_MS: u64 = 60_000;
