use crate::algorithms::disambiguation::DisambiguationPolicy;
use crate::api::types::OutputFormat;
use crate::core::DEFAULT_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Resolver configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Absolute tolerance for geometric comparisons (meters)
    pub tolerance: f64,
    /// How to choose between two intersection points
    pub disambiguation: DisambiguationPolicy,
    /// Treat only the first N input trees as known; the rest become unknown
    /// and keep their coordinates as hints
    pub known_count: Option<usize>,
    /// Refuse to run when input validation reports warnings
    pub strict_validation: bool,
    /// Output format for reports
    pub output_format: OutputFormat,
    /// Decimal places in reports
    pub precision: u8,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            disambiguation: DisambiguationPolicy::default(),
            known_count: None,
            strict_validation: false,
            output_format: OutputFormat::Text,
            precision: 2,
            log_level: "warn".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_disambiguation(mut self, policy: DisambiguationPolicy) -> Self {
        self.disambiguation = policy;
        self
    }

    pub fn with_known_count(mut self, count: usize) -> Self {
        self.known_count = Some(count);
        self
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
            ConfigError::IoError { message } => write!(f, "I/O error: {}", message),
            ConfigError::SerializationError { message } => write!(f, "Serialization error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
const MAX_PRECISION: u8 = 12;
/// Largest accepted geometric tolerance (meters)
const MAX_TOLERANCE: f64 = 1.0;
/// Tolerances above this merge intersection points that are genuinely distinct
const COARSE_TOLERANCE: f64 = 1e-3;

/// Loads, validates and stores resolver configuration
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: ResolverConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a manager holding the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager and load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn update_config(&mut self, config: ResolverConfig) -> Result<(), ConfigError> {
        self.check_config(&config)?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Load configuration from a JSON file. Missing fields keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: ResolverConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        self.check_config(&config)?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the file the configuration was last loaded from or saved to
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Update the geometric tolerance, returning the previous value
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<f64, ConfigError> {
        let candidate = self.config.clone().with_tolerance(tolerance);
        self.check_config(&candidate)?;

        let old_value = self.config.tolerance;
        self.config.tolerance = tolerance;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_disambiguation(&mut self, policy: DisambiguationPolicy) -> DisambiguationPolicy {
        let old_value = self.config.disambiguation;
        self.config.disambiguation = policy;
        self.is_modified = true;
        old_value
    }

    pub fn set_known_count(&mut self, count: Option<usize>) -> Option<usize> {
        let old_value = self.config.known_count;
        self.config.known_count = count;
        self.is_modified = true;
        old_value
    }

    pub fn set_output_format(&mut self, format: OutputFormat) -> OutputFormat {
        let old_value = self.config.output_format;
        self.config.output_format = format;
        self.is_modified = true;
        old_value
    }

    /// Check a configuration without applying it
    pub fn validate_config(&self, config: &ResolverConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !config.tolerance.is_finite() || config.tolerance < 0.0 {
            result.errors.push(ConfigError::InvalidParameter {
                parameter: "tolerance".to_string(),
                value: config.tolerance.to_string(),
                reason: "Tolerance must be a finite, non-negative number of meters".to_string(),
            });
        } else if config.tolerance > MAX_TOLERANCE {
            result.errors.push(ConfigError::InvalidParameter {
                parameter: "tolerance".to_string(),
                value: config.tolerance.to_string(),
                reason: format!("Tolerance must be at most {} m", MAX_TOLERANCE),
            });
        } else if config.tolerance > COARSE_TOLERANCE {
            result
                .warnings
                .push(format!("Tolerance of {} m will merge distinct intersection points", config.tolerance));
        }

        if config.precision > MAX_PRECISION {
            result.errors.push(ConfigError::InvalidParameter {
                parameter: "precision".to_string(),
                value: config.precision.to_string(),
                reason: format!("Precision must be at most {} decimal places", MAX_PRECISION),
            });
        }

        if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
            result.errors.push(ConfigError::InvalidParameter {
                parameter: "log_level".to_string(),
                value: config.log_level.clone(),
                reason: format!("Expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        if config.known_count == Some(0) {
            result
                .warnings
                .push("known_count of 0 leaves no anchors; every tree will stay unresolved".to_string());
        }

        result
    }

    /// Validate `config`, logging its warnings and returning the first error
    pub fn check_config(&self, config: &ResolverConfig) -> Result<(), ConfigError> {
        let result = self.validate_config(config);
        for warning in &result.warnings {
            warn!(warning = %warning, "configuration warning");
        }
        match result.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("multilateration_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        let manager = ConfigurationManager::new();
        let result = manager.validate_config(manager.config());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
        assert_eq!(manager.config().disambiguation, DisambiguationPolicy::ThirdAnchor);
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let mut manager = ConfigurationManager::new();
        assert!(manager.set_tolerance(-1.0).is_err());
        assert!(manager.set_tolerance(f64::NAN).is_err());
        assert_eq!(manager.config().tolerance, DEFAULT_TOLERANCE);

        let old = manager.set_tolerance(1e-6).unwrap();
        assert_eq!(old, DEFAULT_TOLERANCE);
        assert!(manager.is_modified());
    }

    #[test]
    fn test_coarse_tolerance_is_reported_and_huge_rejected() {
        let mut manager = ConfigurationManager::new();

        let coarse = manager.validate_config(&ResolverConfig::new().with_tolerance(0.01));
        assert!(coarse.is_valid());
        assert_eq!(coarse.warnings.len(), 1);
        assert!(manager.set_tolerance(0.01).is_ok());

        assert!(matches!(
            manager.set_tolerance(5.0),
            Err(ConfigError::InvalidParameter { ref parameter, .. }) if parameter == "tolerance"
        ));
        assert_eq!(manager.config().tolerance, 0.01);

        let path = temp_config_path("huge_tolerance");
        std::fs::write(&path, r#"{ "tolerance": 5.0 }"#).unwrap();
        assert!(ConfigurationManager::from_file(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut manager = ConfigurationManager::new();
        let config = ResolverConfig::new().with_log_level("chatty");
        assert!(matches!(
            manager.update_config(config),
            Err(ConfigError::InvalidParameter { ref parameter, .. }) if parameter == "log_level"
        ));
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = temp_config_path("round_trip");
        let mut manager = ConfigurationManager::new();
        manager
            .update_config(
                ResolverConfig::new()
                    .with_disambiguation(DisambiguationPolicy::Hint)
                    .with_known_count(14)
                    .with_output_format(OutputFormat::Json),
            )
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.config(), manager.config());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let path = temp_config_path("partial");
        std::fs::write(&path, r#"{ "disambiguation": "lower-y", "precision": 4 }"#).unwrap();

        let manager = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(manager.config().disambiguation, DisambiguationPolicy::LowerY);
        assert_eq!(manager.config().precision, 4);
        assert_eq!(manager.config().tolerance, DEFAULT_TOLERANCE);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ConfigurationManager::from_file(temp_config_path("does_not_exist"));
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut manager = ConfigurationManager::new();
        assert!(manager.save().is_err());
    }
}
