//! Statistics Calculator Module
//! Descriptive statistics and the 2x2 cross-tabulation of standardized interest.

use crate::data::FinalRecord;
use serde::Serialize;

/// Descriptive statistics for one group of values.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
        }
    }
}

/// One cell of the treatment/control table.
#[derive(Debug, Clone, Serialize)]
pub struct CrossTabCell {
    pub after_event: bool,
    pub high_earnings: bool,
    pub count: usize,
    pub mean_standardized_index: f64,
}

/// Mean standardized index by `(after_event, high_earnings)`.
#[derive(Debug, Clone, Serialize)]
pub struct CrossTab {
    /// Ordered (false,false), (false,true), (true,false), (true,true).
    pub cells: Vec<CrossTabCell>,
    /// `(high_after - high_before) - (low_after - low_before)`; NaN if a cell is empty.
    pub double_difference: f64,
}

impl CrossTab {
    pub fn cell(&self, after_event: bool, high_earnings: bool) -> Option<&CrossTabCell> {
        self.cells
            .iter()
            .find(|c| c.after_event == after_event && c.high_earnings == high_earnings)
    }

    fn mean(&self, after_event: bool, high_earnings: bool) -> f64 {
        self.cell(after_event, high_earnings)
            .map(|c| c.mean_standardized_index)
            .unwrap_or(f64::NAN)
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Count, mean and sample (n-1) variance; non-finite values are ignored.
    pub fn compute_descriptive_stats(values: &[f64]) -> GroupStats {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let n = finite.len();
        if n == 0 {
            return GroupStats::default();
        }

        let mean = finite.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            f64::NAN
        };

        GroupStats {
            count: n,
            mean,
            std: variance.sqrt(),
            variance,
        }
    }

    /// Round half away from zero to `decimals` places.
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }

    pub fn cross_tab(records: &[FinalRecord]) -> CrossTab {
        let mut cells = Vec::with_capacity(4);
        for after_event in [false, true] {
            for high_earnings in [false, true] {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| r.after_event == after_event && r.high_earnings == high_earnings)
                    .map(|r| r.standardized_index)
                    .collect();
                let stats = Self::compute_descriptive_stats(&values);
                cells.push(CrossTabCell {
                    after_event,
                    high_earnings,
                    count: stats.count,
                    mean_standardized_index: stats.mean,
                });
            }
        }

        let mut table = CrossTab {
            cells,
            double_difference: f64::NAN,
        };
        table.double_difference = (table.mean(true, true) - table.mean(false, true))
            - (table.mean(true, false) - table.mean(false, false));
        table
    }
}
