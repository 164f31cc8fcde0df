//! Pipeline configuration for the orchestrator.
//!
//! This module provides configuration options for a pipeline run: storage
//! locations, the quality gate, per-stage timeouts, deployment defaults and
//! the nested Chronicle configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::chronicle::ChronicleConfig;

pub use crate::error::ConfigError;

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Storage settings
    /// Directory receiving pipeline run records.
    pub data_dir: PathBuf,
    /// Directory holding one sub-directory per feature.
    pub projects_dir: PathBuf,

    // Execution settings
    /// Runs whose test score falls below this value stop before deployment.
    pub quality_gate_threshold: f64,
    /// Upper bound on a single agent call.
    pub stage_timeout: Duration,

    // Deployment defaults
    /// Environment used when a request names none.
    pub default_environment: String,
    /// Platform used when a request names none.
    pub default_platform: String,

    /// Chronicle recorder settings.
    pub chronicle: ChronicleConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            projects_dir: PathBuf::from("projects"),

            quality_gate_threshold: 50.0,
            stage_timeout: Duration::from_secs(600), // 10 minutes

            default_environment: "local".to_string(),
            default_platform: "docker".to_string(),

            chronicle: ChronicleConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DEVFORGE_DATA_DIR`: Run record directory (default: data)
    /// - `DEVFORGE_PROJECTS_DIR`: Feature artifact directory (default: projects)
    /// - `DEVFORGE_QUALITY_GATE`: Minimum test score for deployment (default: 50)
    /// - `DEVFORGE_STAGE_TIMEOUT_SECS`: Per-stage timeout in seconds (default: 600)
    /// - `DEVFORGE_ENVIRONMENT`: Default deployment environment (default: local)
    /// - `DEVFORGE_PLATFORM`: Default deployment platform (default: docker)
    /// - `DEVFORGE_CHRONICLE_DIR`, `DEVFORGE_BOTTLENECK_MS`: see [`ChronicleConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            chronicle: ChronicleConfig::from_env()?,
            ..Self::default()
        };

        if let Ok(val) = std::env::var("DEVFORGE_DATA_DIR") {
            config.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("DEVFORGE_PROJECTS_DIR") {
            config.projects_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("DEVFORGE_QUALITY_GATE") {
            config.quality_gate_threshold = parse_env_value(&val, "DEVFORGE_QUALITY_GATE")?;
        }

        if let Ok(val) = std::env::var("DEVFORGE_STAGE_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "DEVFORGE_STAGE_TIMEOUT_SECS")?;
            config.stage_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("DEVFORGE_ENVIRONMENT") {
            config.default_environment = val;
        }

        if let Ok(val) = std::env::var("DEVFORGE_PLATFORM") {
            config.default_platform = val;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.quality_gate_threshold) {
            return Err(ConfigError::ValidationFailed(
                "quality_gate_threshold must be between 0 and 100".to_string(),
            ));
        }

        if self.stage_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "stage_timeout must be greater than 0".to_string(),
            ));
        }

        if self.default_environment.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_environment cannot be empty".to_string(),
            ));
        }

        if self.default_platform.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_platform cannot be empty".to_string(),
            ));
        }

        self.chronicle.validate()
    }

    /// Builder method to set the run record directory.
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Builder method to set the feature artifact directory.
    pub fn with_projects_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.projects_dir = path.into();
        self
    }

    /// Builder method to set the quality gate threshold.
    pub fn with_quality_gate_threshold(mut self, threshold: f64) -> Self {
        self.quality_gate_threshold = threshold;
        self
    }

    /// Builder method to set the per-stage timeout.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Builder method to set the default deployment environment.
    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.default_environment = environment.into();
        self
    }

    /// Builder method to set the default deployment platform.
    pub fn with_default_platform(mut self, platform: impl Into<String>) -> Self {
        self.default_platform = platform.into();
        self
    }

    /// Builder method to set the Chronicle configuration.
    pub fn with_chronicle(mut self, chronicle: ChronicleConfig) -> Self {
        self.chronicle = chronicle;
        self
    }
}

/// Parse an environment variable value into a type.
pub(crate) fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.projects_dir, PathBuf::from("projects"));
        assert!((config.quality_gate_threshold - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.stage_timeout, Duration::from_secs(600));
        assert_eq!(config.default_environment, "local");
        assert_eq!(config.default_platform, "docker");
        assert_eq!(config.chronicle.bottleneck_threshold_ms, 60_000);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_data_dir("/tmp/runs")
            .with_projects_dir("/tmp/projects")
            .with_quality_gate_threshold(75.0)
            .with_stage_timeout(Duration::from_secs(30))
            .with_default_environment("staging")
            .with_default_platform("kubernetes")
            .with_chronicle(ChronicleConfig::new().with_output_dir("/tmp/chronicle"));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/runs"));
        assert_eq!(config.projects_dir, PathBuf::from("/tmp/projects"));
        assert!((config.quality_gate_threshold - 75.0).abs() < f64::EPSILON);
        assert_eq!(config.stage_timeout, Duration::from_secs(30));
        assert_eq!(config.default_environment, "staging");
        assert_eq!(config.default_platform, "kubernetes");
        assert_eq!(config.chronicle.output_dir, PathBuf::from("/tmp/chronicle"));
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_gate_out_of_range() {
        let config = PipelineConfig::new().with_quality_gate_threshold(101.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));

        let config = PipelineConfig::new().with_quality_gate_threshold(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = PipelineConfig::new().with_stage_timeout(Duration::ZERO);
        let err = config.validate().expect_err("zero timeout should fail");
        assert!(err.to_string().contains("stage_timeout"));
    }

    #[test]
    fn test_validation_empty_platform() {
        let config = PipelineConfig::new().with_default_platform("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_value() {
        let value: u64 = parse_env_value("42", "KEY").expect("should parse");
        assert_eq!(value, 42);

        let result: Result<u64, _> = parse_env_value("abc", "DEVFORGE_STAGE_TIMEOUT_SECS");
        match result {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "DEVFORGE_STAGE_TIMEOUT_SECS");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
