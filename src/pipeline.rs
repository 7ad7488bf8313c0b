//! End-to-end analysis: load, join, aggregate, standardize, label, estimate.

use crate::charts::{ChartData, ChartError, StaticChartRenderer};
use crate::config::{AnalysisConfig, ConfigError};
use crate::data::{
    Aggregator, DataLoader, DataProcessor, FinalRecord, Labeler, LoaderError, Normalizer,
    Reconstructor, SourceTables,
};
use crate::report::{ReportError, ReportGenerator};
use crate::stats::{CrossTab, Estimator, RegressionSummary, StatsCalculator};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Row counts after each stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageCounts {
    pub search_rows: usize,
    pub outcome_rows: usize,
    pub name_links: usize,
    pub unique_name_links: usize,
    pub target_outcomes: usize,
    pub joined_rows: usize,
    pub malformed_period_rows: usize,
    pub weekly_rows: usize,
    pub weeks_without_attributes: usize,
    pub undefined_standardized: usize,
    pub final_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub event_date: NaiveDate,
    pub earnings_threshold: f64,
    pub counts: StageCounts,
    pub cross_tab: CrossTab,
    pub regression: Option<RegressionSummary>,
    pub regression_error: Option<String>,
    pub chart: ChartData,
    #[serde(skip)]
    pub records: Vec<FinalRecord>,
}

pub struct Pipeline;

impl Pipeline {
    /// Run every transformation over already-loaded tables.
    pub fn analyze(tables: &SourceTables, config: &AnalysisConfig) -> AnalysisResult {
        let mut counts = StageCounts {
            search_rows: tables.search.len(),
            outcome_rows: tables.outcomes.len(),
            name_links: tables.name_links.len(),
            ..StageCounts::default()
        };

        let (unique_links, target_outcomes, joined) = DataProcessor::build_joined(
            &tables.name_links,
            &tables.search,
            &tables.outcomes,
            config.target_degree,
        );
        counts.unique_name_links = unique_links.len();
        counts.target_outcomes = target_outcomes.len();
        counts.joined_rows = joined.len();

        let aggregation = Aggregator::weekly_totals(&joined, config.week_start);
        counts.malformed_period_rows = aggregation.malformed_rows;
        counts.weekly_rows = aggregation.weekly.len();

        let attributes =
            Reconstructor::attributes(&unique_links, &target_outcomes, config.earnings_threshold);
        let reconstructed = Reconstructor::reconstruct(&aggregation.weekly, &attributes);
        counts.weeks_without_attributes = reconstructed
            .iter()
            .filter(|r| r.attributes.is_none())
            .count();

        let standardized = Normalizer::standardize(reconstructed);
        counts.undefined_standardized = standardized
            .iter()
            .filter(|r| r.standardized_index.is_none())
            .count();

        let records = Labeler::label(standardized, config.event_date);
        counts.final_rows = records.len();

        let cross_tab = StatsCalculator::cross_tab(&records);
        let (regression, regression_error) = match Estimator::fit(&records) {
            Ok(summary) => {
                if let Some(effect) = summary.interaction() {
                    info!(
                        "Interaction estimate {:.4} (se {:.4}, p {:.4})",
                        effect.estimate, effect.std_error, effect.p_value
                    );
                }
                (Some(summary), None)
            }
            Err(e) => {
                warn!("Regression not estimable: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let chart = ChartData::from_records(&records, config.event_date);
        AnalysisResult {
            event_date: config.event_date,
            earnings_threshold: config.earnings_threshold,
            counts,
            cross_tab,
            regression,
            regression_error,
            chart,
            records,
        }
    }

    /// Load the configured inputs and analyze them.
    pub fn run(config: &AnalysisConfig) -> Result<AnalysisResult, PipelineError> {
        config.validate()?;
        let tables = DataLoader::load_all(config)?;
        Ok(Self::analyze(&tables, config))
    }

    /// Write the report, chart and summary to the configured locations.
    pub fn write_outputs(
        result: &AnalysisResult,
        config: &AnalysisConfig,
        report: &str,
    ) -> Result<(), PipelineError> {
        let output = &config.output;
        if let Some(path) = &output.report_path {
            ReportGenerator::write_report(path, report)?;
            info!("Report written to {}", path.display());
        }
        if let Some(path) = &output.summary_path {
            ReportGenerator::write_summary_json(path, result)?;
            info!("Summary written to {}", path.display());
        }
        if let Some(path) = &output.chart_path {
            StaticChartRenderer::render_trend_png(
                &result.chart,
                path,
                output.chart_width,
                output.chart_height,
            )?;
            info!("Chart written to {}", path.display());
        }
        Ok(())
    }
}
