//! Per-institution z-score standardization of weekly totals.

use crate::data::records::{ReconstructedRecord, StandardizedRecord};
use crate::stats::StatsCalculator;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Decimal places kept on the standardized index.
pub const STANDARDIZED_DECIMALS: i32 = 3;

pub struct Normalizer;

impl Normalizer {
    /// Standardize `total_index` within each institution's own series.
    ///
    /// Institutions with fewer than two observations or zero spread, and rows
    /// without attributes, get `None`.
    pub fn standardize(records: Vec<ReconstructedRecord>) -> Vec<StandardizedRecord> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(attrs) = &record.attributes {
                groups
                    .entry(attrs.institution_name.as_str())
                    .or_default()
                    .push(i);
            }
        }
        let groups: Vec<Vec<usize>> = groups.into_values().collect();
        let rows = &records;

        let scores: Vec<(usize, Option<f64>)> = groups
            .par_iter()
            .flat_map_iter(|indices| {
                let values: Vec<f64> = indices.iter().map(|&i| rows[i].total_index).collect();
                let stats = StatsCalculator::compute_descriptive_stats(&values);
                let defined = stats.count >= 2 && stats.std.is_finite() && stats.std > 0.0;
                indices.iter().map(move |&i| {
                    let score = defined.then(|| {
                        StatsCalculator::round_to(
                            (rows[i].total_index - stats.mean) / stats.std,
                            STANDARDIZED_DECIMALS,
                        )
                    });
                    (i, score.filter(|z| z.is_finite()))
                })
            })
            .collect();

        let mut standardized_index = vec![None; records.len()];
        for (i, score) in scores {
            standardized_index[i] = score;
        }

        let undefined = standardized_index.iter().filter(|z| z.is_none()).count();
        debug!("{} institution-weeks have no standardized index", undefined);
        info!("Standardized {} institutions", groups.len());

        records
            .into_iter()
            .zip(standardized_index)
            .map(|(record, standardized_index)| StandardizedRecord {
                record,
                standardized_index,
            })
            .collect()
    }
}
