//! Scorecard Trends - did the College Scorecard shift search interest toward
//! high-earnings colleges?
//!
//! Joins Google Trends search indices with College Scorecard outcomes,
//! standardizes weekly interest per institution and fits a
//! difference-in-differences regression.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::AnalysisConfig;
pub use pipeline::{AnalysisResult, Pipeline, PipelineError, StageCounts};
