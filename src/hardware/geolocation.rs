//! Geolocation stream interface

use crate::core::PositionSample;
use crate::hardware::LocateResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options for opening a continuous position stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Ask for the most accurate fix the platform can deliver
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back (ms); 0 forces fresh fixes
    pub max_sample_age_ms: u64,
    /// Stream-internal timeout for each sample (ms)
    pub per_sample_timeout_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_sample_age_ms: 0,
            per_sample_timeout_ms: 60_000,
        }
    }
}

/// Platform geolocation capability
pub trait PositionSource: Send {
    /// Whether the platform exposes geolocation at all
    fn is_available(&self) -> bool;

    /// Open a continuous stream; the returned handle owns the subscription
    fn watch(&mut self, options: &WatchOptions) -> LocateResult<Box<dyn PositionWatch>>;
}

/// Live subscription to a position stream
///
/// `stop` is the only way to release the subscription and must be
/// idempotent.
#[async_trait]
pub trait PositionWatch: Send {
    /// Wait for the next sample or a fatal stream error
    ///
    /// Must be cancel safe: dropping the future before it completes must not
    /// lose a sample.
    async fn next_sample(&mut self) -> LocateResult<PositionSample>;

    /// Stop sampling
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}
