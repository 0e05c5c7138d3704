//! Sensor stream processing

pub mod acquisition;
pub mod heading;

pub use acquisition::PositionAcquirer;
pub use heading::{normalize, probe, HeadingProbe, HeadingSource, HeadingSubscription};
