//! Analysis configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file (or none at all) is enough.

use crate::data::PredominantDegree;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Output locations and chart size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: Option<PathBuf>,
    pub chart_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: None,
            chart_path: None,
            summary_path: None,
            chart_width: 1200,
            chart_height: 700,
        }
    }
}

/// Inputs, thresholds and outputs of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding every input file.
    pub data_dir: PathBuf,
    /// Search-interest files are every file in `data_dir` starting with this.
    pub search_file_prefix: String,
    pub outcomes_file: PathBuf,
    pub name_link_file: PathBuf,
    /// Earnings column in the outcomes file (matched case-insensitively).
    pub earnings_column: String,
    pub target_degree: PredominantDegree,
    /// Public release of the Scorecard.
    pub event_date: NaiveDate,
    pub earnings_threshold: f64,
    pub week_start: Weekday,
    pub output: OutputConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            search_file_prefix: "trends_up_to_".to_string(),
            outcomes_file: PathBuf::from("Most+Recent+Cohorts+(Scorecard+Elements).csv"),
            name_link_file: PathBuf::from("id_name_link.csv"),
            earnings_column: "md_earn_wne_p10-REPORTED-EARNINGS".to_string(),
            target_degree: PredominantDegree::Bachelors,
            event_date: NaiveDate::from_ymd_opt(2015, 9, 1).unwrap_or_default(),
            earnings_threshold: 41_300.0,
            week_start: Weekday::Sun,
            output: OutputConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON config file; missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_file_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "search_file_prefix must not be empty".to_string(),
            ));
        }
        if self.earnings_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "earnings_column must not be empty".to_string(),
            ));
        }
        if !self.earnings_threshold.is_finite() || self.earnings_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "earnings_threshold must be a non-negative number, got {}",
                self.earnings_threshold
            )));
        }
        if self.output.chart_width == 0 || self.output.chart_height == 0 {
            return Err(ConfigError::Invalid(
                "chart dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn outcomes_path(&self) -> PathBuf {
        self.data_dir.join(&self.outcomes_file)
    }

    pub fn name_link_path(&self) -> PathBuf {
        self.data_dir.join(&self.name_link_file)
    }
}
