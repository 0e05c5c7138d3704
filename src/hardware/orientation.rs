//! Device orientation event interface

use crate::hardware::LocateResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw orientation event as delivered by the platform
///
/// Platforms fill one of two conventions: a direct compass heading that is
/// already clockwise from North, or a rotation around the vertical axis
/// (`alpha`) counter-clockwise from a device-dependent zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationEvent {
    pub compass_heading: Option<f64>,
    pub alpha: Option<f64>,
}

impl OrientationEvent {
    pub fn compass(degrees: f64) -> Self {
        Self {
            compass_heading: Some(degrees),
            alpha: None,
        }
    }

    pub fn rotation(alpha: f64) -> Self {
        Self {
            compass_heading: None,
            alpha: Some(alpha),
        }
    }
}

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Access negotiation for orientation events
#[async_trait]
pub trait PermissionGate: Send {
    /// Whether events only fire after an explicit permission grant
    fn requires_permission(&self) -> bool;

    /// Ask the user for access; only meaningful when `requires_permission` is true
    async fn request_permission(&mut self) -> LocateResult<PermissionState>;
}

/// Stream of raw orientation events
#[async_trait]
pub trait OrientationStream: Send {
    /// Wait for the next event; `None` once the stream has ended
    async fn next_event(&mut self) -> Option<OrientationEvent>;
}

/// Platform orientation capability
///
/// The permission prompt and the event stream are independent platform
/// APIs, so a prompt can be shown while events are being listened to.
pub trait OrientationSensor: Send {
    type Gate: PermissionGate + 'static;
    type Stream: OrientationStream + 'static;

    fn split(self) -> (Self::Gate, Self::Stream);
}
