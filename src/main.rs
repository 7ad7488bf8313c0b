//! Scorecard Trends - command line entry point.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use scorecard_trends::report::ReportGenerator;
use scorecard_trends::{AnalysisConfig, Pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scorecard-trends")]
#[command(about = "College Scorecard search-interest analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis and print the report
    Run {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory holding the input files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Treatment boundary, YYYY-MM-DD
        #[arg(long)]
        event_date: Option<NaiveDate>,
        /// Earnings at or above this are "high earnings"
        #[arg(long)]
        earnings_threshold: Option<f64>,
        /// Write the Markdown report here
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write the trend chart (PNG) here
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Write a JSON summary here
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Print the default configuration as JSON
    DefaultConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            data_dir,
            event_date,
            earnings_threshold,
            report,
            chart,
            summary,
        } => {
            let mut settings = match &config {
                Some(path) => AnalysisConfig::from_file(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => AnalysisConfig::default(),
            };
            if let Some(dir) = data_dir {
                settings.data_dir = dir;
            }
            if let Some(date) = event_date {
                settings.event_date = date;
            }
            if let Some(threshold) = earnings_threshold {
                settings.earnings_threshold = threshold;
            }
            if report.is_some() {
                settings.output.report_path = report;
            }
            if chart.is_some() {
                settings.output.chart_path = chart;
            }
            if summary.is_some() {
                settings.output.summary_path = summary;
            }

            info!("Reading inputs from {}", settings.data_dir.display());
            let result = Pipeline::run(&settings).context("analysis failed")?;
            let text = ReportGenerator::render_markdown(&result);
            println!("{}", text);
            Pipeline::write_outputs(&result, &settings, &text).context("writing outputs")?;
        }
        Commands::DefaultConfig => {
            let json = serde_json::to_string_pretty(&AnalysisConfig::default())?;
            println!("{}", json);
        }
    }
    Ok(())
}
