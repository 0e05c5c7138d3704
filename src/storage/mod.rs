//! Saved parking spot persistence

pub mod spot;

pub use spot::{JsonSpotStore, MemorySpotStore, SavedSpot, SpotStore, StoreError, StoreResult};
