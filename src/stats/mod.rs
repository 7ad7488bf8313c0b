//! Stats module - descriptive statistics and regression

mod calculator;
mod estimator;

pub use calculator::{CrossTab, CrossTabCell, GroupStats, StatsCalculator};
pub use estimator::{Coefficient, EstimateError, Estimator, RegressionSummary, TERMS};
