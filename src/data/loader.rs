//! CSV Data Loader Module
//! Reads the three raw sources with Polars and converts them into typed records.

use crate::data::records::{NameLink, OutcomeRecord, PredominantDegree, SearchRecord};
use crate::data::schema;
use log::{debug, info};
use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Input file not found: {0}")]
    MissingFile(PathBuf),
    #[error("Failed to list data directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No search-interest files starting with '{prefix}' in {dir}")]
    NoSearchFiles { dir: PathBuf, prefix: String },
    #[error("Column '{column}' missing from {path}")]
    MissingColumn { path: PathBuf, column: String },
}

/// Everything the pipeline reads, already typed.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub search: Vec<SearchRecord>,
    pub outcomes: Vec<OutcomeRecord>,
    pub name_links: Vec<NameLink>,
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file and fold its headers into the canonical convention.
    ///
    /// Every column is read as text; the typed parsers below see each raw cell.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }
        let csv_err = |source| LoaderError::CsvError {
            path: path.to_path_buf(),
            source,
        };

        let mut df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(csv_err)?;

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| schema::canonical(name.as_str()))
            .collect();
        df.set_column_names(names).map_err(csv_err)?;

        debug!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// List search-interest files in `dir` whose names start with `prefix`, sorted by name.
    pub fn search_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, LoaderError> {
        let entries = fs::read_dir(dir).map_err(|source| LoaderError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LoaderError::ReadDir {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(LoaderError::NoSearchFiles {
                dir: dir.to_path_buf(),
                prefix: prefix.to_string(),
            });
        }
        Ok(files)
    }

    /// Load every search file in parallel; rows keep file-name order.
    pub fn load_search_records(paths: &[PathBuf]) -> Result<Vec<SearchRecord>, LoaderError> {
        let per_file = paths
            .par_iter()
            .map(|path| Self::load_search_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    fn load_search_file(path: &Path) -> Result<Vec<SearchRecord>, LoaderError> {
        let df = Self::load_csv(path)?;
        Self::require_columns(&df, path, &schema::SEARCH_COLUMNS)?;

        let names = Self::string_column(&df, path, schema::INSTITUTION_NAME)?;
        let keywords = Self::string_column(&df, path, schema::KEYWORD)?;
        let periods = Self::string_column(&df, path, schema::PERIOD_LABEL)?;
        let indices = Self::string_column(&df, path, schema::SEARCH_INDEX)?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for (((name, keyword), period), index) in names
            .into_iter()
            .zip(keywords)
            .zip(periods)
            .zip(indices)
        {
            match (name, period) {
                (Some(institution_name), Some(period_label)) => records.push(SearchRecord {
                    institution_name,
                    keyword: keyword.unwrap_or_default(),
                    period_label,
                    search_index: index.as_deref().and_then(parse_number),
                }),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(
                "Skipped {} search rows without name or period in {}",
                skipped,
                path.display()
            );
        }
        Ok(records)
    }

    /// Load the outcomes table. `earnings_column` is matched case-insensitively.
    pub fn load_outcomes(
        path: &Path,
        earnings_column: &str,
    ) -> Result<Vec<OutcomeRecord>, LoaderError> {
        let df = Self::load_csv(path)?;
        let earnings_column = schema::canonical(earnings_column);
        Self::require_columns(&df, path, &schema::OUTCOME_KEY_COLUMNS)?;
        Self::require_columns(&df, path, &[earnings_column.as_str()])?;

        let unit_ids = Self::string_column(&df, path, schema::UNIT_ID)?;
        let operator_ids = Self::string_column(&df, path, schema::OPERATOR_ID)?;
        let degrees = Self::string_column(&df, path, schema::PREDOMINANT_DEGREE)?;
        let earnings = Self::string_column(&df, path, &earnings_column)?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for (((unit_id, operator_id), degree), earning) in unit_ids
            .into_iter()
            .zip(operator_ids)
            .zip(degrees)
            .zip(earnings)
        {
            let ids = (
                unit_id.as_deref().and_then(parse_id),
                operator_id.as_deref().and_then(parse_id),
            );
            let (Some(unit_id), Some(operator_id)) = ids else {
                skipped += 1;
                continue;
            };
            records.push(OutcomeRecord {
                unit_id,
                operator_id,
                predominant_degree: degree
                    .as_deref()
                    .and_then(parse_id)
                    .and_then(PredominantDegree::from_code),
                reported_earnings: earning.as_deref().and_then(parse_number),
            });
        }
        if skipped > 0 {
            debug!("Skipped {} outcome rows with unusable ids", skipped);
        }
        Ok(records)
    }

    /// Load the name-to-identifier crosswalk.
    pub fn load_name_links(path: &Path) -> Result<Vec<NameLink>, LoaderError> {
        let df = Self::load_csv(path)?;
        Self::require_columns(&df, path, &schema::NAME_LINK_COLUMNS)?;

        let names = Self::string_column(&df, path, schema::INSTITUTION_NAME)?;
        let unit_ids = Self::string_column(&df, path, schema::UNIT_ID)?;
        let operator_ids = Self::string_column(&df, path, schema::OPERATOR_ID)?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for ((name, unit_id), operator_id) in names.into_iter().zip(unit_ids).zip(operator_ids) {
            match (
                name,
                unit_id.as_deref().and_then(parse_id),
                operator_id.as_deref().and_then(parse_id),
            ) {
                (Some(institution_name), Some(unit_id), Some(operator_id)) => {
                    records.push(NameLink {
                        institution_name,
                        unit_id,
                        operator_id,
                    })
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("Skipped {} incomplete name-link rows", skipped);
        }
        Ok(records)
    }

    /// Load all three sources named by the configuration.
    pub fn load_all(config: &crate::config::AnalysisConfig) -> Result<SourceTables, LoaderError> {
        let search_paths = Self::search_files(&config.data_dir, &config.search_file_prefix)?;
        let search = Self::load_search_records(&search_paths)?;
        let outcomes = Self::load_outcomes(&config.outcomes_path(), &config.earnings_column)?;
        let name_links = Self::load_name_links(&config.name_link_path())?;

        info!(
            "Loaded {} search rows from {} files, {} outcome rows, {} name links",
            search.len(),
            search_paths.len(),
            outcomes.len(),
            name_links.len()
        );
        Ok(SourceTables {
            search,
            outcomes,
            name_links,
        })
    }

    fn require_columns(df: &DataFrame, path: &Path, columns: &[&str]) -> Result<(), LoaderError> {
        let present = df.get_column_names();
        for column in columns {
            if !present.iter().any(|name| name.as_str() == *column) {
                return Err(LoaderError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Read a column as trimmed strings.
    fn string_column(
        df: &DataFrame,
        path: &Path,
        column: &str,
    ) -> Result<Vec<Option<String>>, LoaderError> {
        let csv_err = |source| LoaderError::CsvError {
            path: path.to_path_buf(),
            source,
        };
        let values = df.column(column).map_err(|_| LoaderError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;
        let as_string = values.cast(&DataType::String).map_err(csv_err)?;
        let chunked = as_string.as_materialized_series().str().map_err(csv_err)?;

        Ok(chunked
            .into_iter()
            .map(|value| {
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }
}

/// Parse a numeric cell; sentinels such as `NULL` or `PrivacySuppressed` become `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer id, accepting integral floats such as `100654.0`.
pub fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        parse_number(raw)
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    })
}
