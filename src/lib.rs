//! Parked Spot Finder
//!
//! On-device navigation back to a saved parking spot: best-of position
//! acquisition, compass heading normalization, distance and arrow fusion,
//! and a parking-meter countdown.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod hardware;
pub mod reminder;
pub mod storage;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use self::core::{Clock, CountdownState, GeoPoint, HeadingReading, PositionSample, SystemClock, TokioClock};
pub use self::algorithms::{distance_meters, format_distance, fuse, initial_bearing_degrees, NavigationFix, NavigationState};
pub use self::processing::{HeadingSource, HeadingSubscription, PositionAcquirer};
pub use self::hardware::{LocateError, LocateResult, OrientationSensor, PositionSource, PositionWatch};
pub use self::reminder::{format_remaining, AlertSink, CountdownTimer, ExpiryWatcher};
pub use self::storage::{JsonSpotStore, SavedSpot, SpotStore};
pub use self::utils::{ConfigurationManager, SpotfinderConfig};
pub use self::api::{JsonFormatter, NavigationPanel, TextFormatter};
