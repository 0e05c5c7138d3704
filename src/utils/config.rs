use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Position acquisition parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Upper bound on waiting for a better fix (milliseconds)
    pub max_wait_ms: u64,
    /// Accuracy that ends acquisition early (meters)
    pub desired_accuracy_m: f64,
    /// Stream-internal timeout for each sample (milliseconds)
    pub per_sample_timeout_ms: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_wait_ms: 20_000,
            desired_accuracy_m: 25.0,
            per_sample_timeout_ms: 60_000,
        }
    }
}

/// Parking-meter reminder parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Scheduler cadence (milliseconds)
    pub tick_interval_ms: u64,
    /// Countdown length offered when the user has not picked one (minutes)
    pub default_minutes: f64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            default_minutes: 60.0,
        }
    }
}

/// System-wide configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotfinderConfig {
    pub acquisition: AcquisitionConfig,
    pub reminder: ReminderConfig,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("Configuration error: invalid {parameter} = {value} ({reason})")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Configuration file I/O error
    #[error("{message}")]
    IoError { message: String },
    /// JSON serialization/deserialization error
    #[error("{message}")]
    SerializationError { message: String },
}

impl ConfigError {
    fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl SpotfinderConfig {
    /// Check every parameter against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let acquisition = &self.acquisition;
        if !(1_000..=120_000).contains(&acquisition.max_wait_ms) {
            return Err(ConfigError::invalid(
                "acquisition.max_wait_ms",
                acquisition.max_wait_ms,
                "must be between 1000 and 120000 ms",
            ));
        }
        if !acquisition.desired_accuracy_m.is_finite()
            || acquisition.desired_accuracy_m <= 0.0
            || acquisition.desired_accuracy_m > 1_000.0
        {
            return Err(ConfigError::invalid(
                "acquisition.desired_accuracy_m",
                acquisition.desired_accuracy_m,
                "must be positive and at most 1000 m",
            ));
        }
        if acquisition.per_sample_timeout_ms < acquisition.max_wait_ms {
            return Err(ConfigError::invalid(
                "acquisition.per_sample_timeout_ms",
                acquisition.per_sample_timeout_ms,
                "must not be shorter than max_wait_ms",
            ));
        }

        let reminder = &self.reminder;
        if !(50..=10_000).contains(&reminder.tick_interval_ms) {
            return Err(ConfigError::invalid(
                "reminder.tick_interval_ms",
                reminder.tick_interval_ms,
                "must be between 50 and 10000 ms",
            ));
        }
        if !reminder.default_minutes.is_finite()
            || reminder.default_minutes < 1.0
            || reminder.default_minutes > 24.0 * 60.0
        {
            return Err(ConfigError::invalid(
                "reminder.default_minutes",
                reminder.default_minutes,
                "must be between 1 minute and 24 hours",
            ));
        }
        Ok(())
    }
}

/// Main configuration manager
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: SpotfinderConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &SpotfinderConfig {
        &self.config
    }

    /// Replace the configuration after validation
    pub fn update_config(&mut self, config: SpotfinderConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: SpotfinderConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        config.validate()?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment

    /// Update the acquisition wait bound, returning the old value
    ///
    /// The per-sample timeout is raised to match when it would otherwise be
    /// shorter than the new bound.
    pub fn set_max_wait(&mut self, max_wait_ms: u64) -> Result<u64, ConfigError> {
        let mut config = self.config;
        config.acquisition.max_wait_ms = max_wait_ms;
        config.acquisition.per_sample_timeout_ms =
            config.acquisition.per_sample_timeout_ms.max(max_wait_ms);
        let old_value = self.config.acquisition.max_wait_ms;
        self.update_config(config)?;
        Ok(old_value)
    }

    /// Update the stream's per-sample timeout, returning the old value
    pub fn set_per_sample_timeout(&mut self, per_sample_timeout_ms: u64) -> Result<u64, ConfigError> {
        let mut config = self.config;
        config.acquisition.per_sample_timeout_ms = per_sample_timeout_ms;
        let old_value = self.config.acquisition.per_sample_timeout_ms;
        self.update_config(config)?;
        Ok(old_value)
    }

    /// Update the accuracy target, returning the old value
    pub fn set_desired_accuracy(&mut self, desired_accuracy_m: f64) -> Result<f64, ConfigError> {
        let mut config = self.config;
        config.acquisition.desired_accuracy_m = desired_accuracy_m;
        let old_value = self.config.acquisition.desired_accuracy_m;
        self.update_config(config)?;
        Ok(old_value)
    }

    /// Update the reminder cadence, returning the old value
    pub fn set_tick_interval(&mut self, tick_interval_ms: u64) -> Result<u64, ConfigError> {
        let mut config = self.config;
        config.reminder.tick_interval_ms = tick_interval_ms;
        let old_value = self.config.reminder.tick_interval_ms;
        self.update_config(config)?;
        Ok(old_value)
    }
}
