//! Navigation algorithms

pub mod geo;
pub mod fusion;

pub use geo::{distance_meters, format_distance, initial_bearing_degrees, wrap_360};
pub use fusion::{arrow_rotation, fuse, NavigationFix, NavigationState};
