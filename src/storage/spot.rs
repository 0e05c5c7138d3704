//! The saved spot record and the stores that keep it
//!
//! At most one spot is saved at a time. The on-disk form is a camelCase JSON
//! object; optional fields are omitted when absent.

use crate::core::{GeoPoint, PositionSample};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the vehicle was left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSpot {
    pub lat: f64,
    pub lon: f64,
    /// Accuracy of the fix when the spot was saved (m)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Opaque reference to a photo of the spot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    /// Wall-clock save time (ms since epoch)
    pub when_ms: u64,
}

impl SavedSpot {
    /// Record an acquired fix as the saved spot
    pub fn from_sample(sample: &PositionSample, when_ms: u64) -> Self {
        Self {
            lat: sample.point.lat,
            lon: sample.point.lon,
            accuracy: sample.accuracy_m,
            note: None,
            photo_ref: None,
            when_ms,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_photo_ref(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    /// Navigation target
    pub fn target(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Persistence errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access spot file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Saved spot is unreadable: {message}")]
    Corrupt { message: String },
}

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Keeps the single saved spot
pub trait SpotStore {
    /// The saved spot, or `None` if nothing is saved
    fn load(&self) -> StoreResult<Option<SavedSpot>>;

    /// Replace the saved spot
    fn save(&mut self, spot: &SavedSpot) -> StoreResult<()>;

    /// Forget the saved spot; clearing an empty store succeeds
    fn clear(&mut self) -> StoreResult<()>;
}

/// In-memory store for tests and the demo binary
#[derive(Debug, Clone, Default)]
pub struct MemorySpotStore {
    spot: Option<SavedSpot>,
}

impl MemorySpotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpotStore for MemorySpotStore {
    fn load(&self) -> StoreResult<Option<SavedSpot>> {
        Ok(self.spot.clone())
    }

    fn save(&mut self, spot: &SavedSpot) -> StoreResult<()> {
        self.spot = Some(spot.clone());
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.spot = None;
        Ok(())
    }
}

/// Store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonSpotStore {
    path: PathBuf,
}

impl JsonSpotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, error: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.to_string_lossy().to_string(),
            message: error.to_string(),
        }
    }
}

impl SpotStore for JsonSpotStore {
    fn load(&self) -> StoreResult<Option<SavedSpot>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved spot");
                return Ok(None);
            }
            Err(error) => return Err(self.io_error(error)),
        };

        let spot = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            message: e.to_string(),
        })?;
        Ok(Some(spot))
    }

    fn save(&mut self, spot: &SavedSpot) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(spot).map_err(|e| StoreError::Corrupt {
            message: e.to_string(),
        })?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))?;
        info!(lat = spot.lat, lon = spot.lon, accuracy_m = ?spot.accuracy, "spot saved");
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "saved spot cleared");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.io_error(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spot() -> SavedSpot {
        let sample = PositionSample::new(GeoPoint::new(47.4979, 19.0402), Some(8.0), 1_000);
        SavedSpot::from_sample(&sample, 1_700_000_000_000).with_note("Level 2, row C")
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(spot().with_photo_ref("photo-17")).unwrap();
        assert_eq!(json["whenMs"], 1_700_000_000_000u64);
        assert_eq!(json["photoRef"], "photo-17");
        assert_eq!(json["accuracy"], 8.0);

        let bare = SavedSpot {
            accuracy: None,
            note: None,
            ..spot()
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("accuracy").is_none());
        assert!(json.get("note").is_none());
        assert!(json.get("photoRef").is_none());
    }

    #[test]
    fn test_parses_minimal_record() {
        let parsed: SavedSpot =
            serde_json::from_str(r#"{"lat": 1.5, "lon": -2.0, "whenMs": 42}"#).unwrap();
        assert_eq!(parsed.target(), GeoPoint::new(1.5, -2.0));
        assert_eq!(parsed.accuracy, None);
        assert_eq!(parsed.when_ms, 42);
    }

    #[test]
    fn test_json_store_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonSpotStore::new(dir.path().join("spot.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&spot()).unwrap();
        assert_eq!(store.load().unwrap(), Some(spot()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spot.json");
        fs::write(&path, "{\"lat\": 1.0").unwrap();

        let store = JsonSpotStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonSpotStore::new(dir.path().join("missing").join("spot.json"));
        assert!(matches!(store.save(&spot()), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemorySpotStore::new();
        store.save(&spot()).unwrap();
        assert_eq!(store.load().unwrap().map(|s| s.target()), Some(spot().target()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
