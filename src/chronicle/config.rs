//! Configuration for the Chronicle recorder.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::pipeline::config::parse_env_value;

/// Default directory for chronicle reports and narratives.
pub const DEFAULT_CHRONICLE_DIR: &str = "data/chronicle";

/// Configuration for the Chronicle recorder and its report synthesis.
#[derive(Debug, Clone)]
pub struct ChronicleConfig {
    /// Directory receiving `{session_id}.json` and `{session_id}_narrative.md`.
    pub output_dir: PathBuf,
    /// Actions strictly longer than this are reported as bottlenecks.
    pub bottleneck_threshold_ms: u64,
    /// Maximum characters kept when summarizing action inputs and outputs.
    pub summary_max_chars: usize,
    /// Maximum mapping keys listed in a summary.
    pub summary_max_keys: usize,
    /// Number of timeline events reproduced in the narrative.
    pub timeline_excerpt: usize,
}

impl Default for ChronicleConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_CHRONICLE_DIR),
            bottleneck_threshold_ms: 60_000,
            summary_max_chars: 200,
            summary_max_keys: 5,
            timeline_excerpt: 20,
        }
    }
}

impl ChronicleConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DEVFORGE_CHRONICLE_DIR`: Output directory (default: data/chronicle)
    /// - `DEVFORGE_BOTTLENECK_MS`: Bottleneck threshold in ms (default: 60000)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DEVFORGE_CHRONICLE_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("DEVFORGE_BOTTLENECK_MS") {
            config.bottleneck_threshold_ms = parse_env_value(&val, "DEVFORGE_BOTTLENECK_MS")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "chronicle output_dir cannot be empty".to_string(),
            ));
        }

        if self.summary_max_chars == 0 {
            return Err(ConfigError::ValidationFailed(
                "summary_max_chars must be greater than 0".to_string(),
            ));
        }

        if self.summary_max_keys == 0 {
            return Err(ConfigError::ValidationFailed(
                "summary_max_keys must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to set the bottleneck threshold.
    pub fn with_bottleneck_threshold_ms(mut self, threshold: u64) -> Self {
        self.bottleneck_threshold_ms = threshold;
        self
    }

    /// Builder method to set the summary length cap.
    pub fn with_summary_max_chars(mut self, max: usize) -> Self {
        self.summary_max_chars = max;
        self
    }

    /// Builder method to set the number of narrative timeline events.
    pub fn with_timeline_excerpt(mut self, count: usize) -> Self {
        self.timeline_excerpt = count;
        self
    }
}
