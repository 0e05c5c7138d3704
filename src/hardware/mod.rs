//! Sensor abstraction layer
//!
//! Contracts for the platform geolocation stream and orientation events,
//! plus mock implementations used by tests and the demo binary.

pub mod error;
pub mod geolocation;
pub mod orientation;
pub mod mock;

pub use error::{LocateError, LocateResult};
pub use geolocation::{PositionSource, PositionWatch, WatchOptions};
pub use orientation::{
    OrientationEvent, OrientationSensor, OrientationStream, PermissionGate, PermissionState,
};
pub use mock::{
    MockOrientationSensor, MockOrientationStream, MockPermissionGate, MockPositionSource,
    ScriptedFix, WatchStats,
};
