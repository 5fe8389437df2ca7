//! Analysis settings, with defaults and an optional RON file.
//!
//! A configuration file only has to name the fields it changes:
//!
//! ```text
//! (frame_size: 2048, hop_size: 1024, num_points: 20)
//! ```

use crate::estimator::{EstimatorSettings, DEFAULT_ENERGY_THRESHOLD, DEFAULT_EPSILON};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, fs, io, path::Path, time::Duration};

/// Everything that shapes a run besides the input file and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analysis window length in samples
    pub frame_size: usize,
    /// Advance between frames in samples
    pub hop_size: usize,
    /// Bins with a W magnitude below this are dropped
    pub energy_threshold: f64,
    /// Guard for near-zero denominators and vectors
    pub epsilon: f64,
    /// Maximum points sent per frame
    pub num_points: usize,
    /// Pause after each frame that produced points, in milliseconds
    pub frame_delay_ms: u64,
    /// Log progress every this many frames
    pub report_interval: usize,
    /// Analyze frames on a worker thread
    pub threaded: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 512,
            energy_threshold: DEFAULT_ENERGY_THRESHOLD,
            epsilon: DEFAULT_EPSILON,
            num_points: 50,
            frame_delay_ms: 50,
            report_interval: 20,
            threaded: false,
        }
    }
}

/// Errors from loading or checking an [AnalysisConfig].
#[derive(Debug)]
pub enum ConfigError {
    /// Could not read the configuration file.
    Io(io::Error),

    /// The file is not valid RON for this structure.
    Parse(ron::de::SpannedError),

    /// Serializing the configuration failed.
    Serialize(ron::Error),

    /// The values parse but make no sense together.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ConfigError::Io(error) => Cow::from(format!("io error: {}", error)),
            ConfigError::Parse(error) => Cow::from(format!("ron parse error: {}", error)),
            ConfigError::Serialize(error) => Cow::from(format!("ron error: {}", error)),
            ConfigError::Invalid(reason) => Cow::from(format!("invalid configuration: {}", reason)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl AnalysisConfig {
    /// Reads a configuration from a RON file. Missing fields take defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_ron_str(&text)
    }

    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::de::from_str(text).map_err(ConfigError::Parse)
    }

    /// Pretty RON rendering, suitable as a starting point for a file.
    pub fn to_ron_pretty(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::Serialize)
    }

    /// Checks that the values describe a runnable analysis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid(reason));

        if self.hop_size == 0 {
            return invalid("hop_size must be positive".to_string());
        }
        if self.frame_size <= self.hop_size {
            return invalid(format!(
                "frame_size ({}) must be larger than hop_size ({})",
                self.frame_size, self.hop_size
            ));
        }
        if self.frame_size < 4 {
            return invalid(format!("frame_size ({}) must be at least 4", self.frame_size));
        }
        if self.num_points == 0 {
            return invalid("num_points must be positive".to_string());
        }
        if self.report_interval == 0 {
            return invalid("report_interval must be positive".to_string());
        }
        if !(self.energy_threshold.is_finite() && self.energy_threshold >= 0.0) {
            return invalid(format!(
                "energy_threshold ({}) must be finite and non-negative",
                self.energy_threshold
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid(format!("epsilon ({}) must be finite and positive", self.epsilon));
        }
        Ok(())
    }

    /// The estimator gates taken from this configuration.
    pub fn estimator_settings(&self) -> EstimatorSettings {
        EstimatorSettings {
            energy_threshold: self.energy_threshold,
            epsilon: self.epsilon,
        }
    }

    /// Pause between emitted frames.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }
}
