//! Navigation fusion
//!
//! Folds the latest live position, the saved target and an optional compass
//! heading into a distance and an arrow rotation. Missing inputs suppress the
//! output instead of failing.

use crate::algorithms::geo::{distance_meters, initial_bearing_degrees, wrap_360};
use crate::core::{GeoPoint, HeadingReading, PositionSample};
use serde::{Deserialize, Serialize};

/// Status shown while position or target is missing
pub const WAITING_FOR_POSITION: &str = "Waiting for position";

/// Result of fusing position, target and heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationFix {
    /// Great-circle distance to the target (m)
    pub distance_m: f64,
    /// Absolute bearing to the target, whole degrees in [0, 360)
    pub bearing_deg: u16,
    /// Rotation to apply to the on-screen arrow, degrees in [0, 360)
    pub arrow_rotation_deg: f64,
    /// Heading folded into the rotation, if any
    pub heading_deg: Option<f64>,
}

impl NavigationFix {
    /// Arrow is relative to where the device faces rather than to North
    pub fn is_heading_relative(&self) -> bool {
        self.heading_deg.is_some()
    }
}

/// Arrow rotation for an absolute bearing
///
/// Without a heading the arrow assumes device "up" is North and points along
/// the bearing itself.
pub fn arrow_rotation(bearing_deg: f64, heading_deg: Option<f64>) -> f64 {
    match heading_deg {
        Some(heading) => wrap_360(bearing_deg - heading + 360.0),
        None => wrap_360(bearing_deg),
    }
}

/// Fuse the three inputs into a fix; `None` while live position or target is absent
pub fn fuse(
    live: Option<&PositionSample>,
    target: Option<&GeoPoint>,
    heading_deg: Option<f64>,
) -> Option<NavigationFix> {
    let (live, target) = (live?, target?);

    let distance_m = distance_meters(&live.point, target);
    let bearing_deg = (initial_bearing_degrees(&live.point, target).round() as u16) % 360;
    let heading_deg = heading_deg.filter(|h| h.is_finite());

    Some(NavigationFix {
        distance_m,
        bearing_deg,
        arrow_rotation_deg: arrow_rotation(f64::from(bearing_deg), heading_deg),
        heading_deg,
    })
}

/// Latest value of each independent input stream
///
/// Position and heading updates may arrive in any order, or not at all.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    live: Option<PositionSample>,
    target: Option<GeoPoint>,
    heading_deg: Option<f64>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: GeoPoint) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn update_position(&mut self, sample: PositionSample) {
        self.live = Some(sample);
    }

    /// Take the heading of the latest tick; a tick without degrees drops back to absolute mode
    pub fn update_heading(&mut self, reading: &HeadingReading) {
        self.heading_deg = reading.degrees;
    }

    pub fn set_target(&mut self, target: GeoPoint) {
        self.target = Some(target);
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn live(&self) -> Option<&PositionSample> {
        self.live.as_ref()
    }

    pub fn target(&self) -> Option<&GeoPoint> {
        self.target.as_ref()
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading_deg
    }

    pub fn fix(&self) -> Option<NavigationFix> {
        fuse(self.live.as_ref(), self.target.as_ref(), self.heading_deg)
    }
}
