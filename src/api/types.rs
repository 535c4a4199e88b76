//! API data types shared by the formatters and the binary

use crate::utils::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output format options for resolved layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Structured JSON document
    Json,
    /// One row per tree
    Csv,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ConfigError::InvalidParameter {
                parameter: "output_format".to_string(),
                value: other.to_string(),
                reason: "Expected one of text, json, csv".to_string(),
            }),
        }
    }
}

/// Final status of a resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every tree has a position
    Success,
    /// Some trees could not be resolved
    Exhausted,
}

/// One tree in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub id: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub name: String,
    pub known: bool,
}

/// One engine step in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub tree_id: Option<String>,
    pub outcome: String,
    pub detail: String,
}

/// Serializable summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub status: RunStatus,
    pub trees: Vec<TreeRecord>,
    pub unresolved: Vec<String>,
    pub steps: Vec<StepRecord>,
}
