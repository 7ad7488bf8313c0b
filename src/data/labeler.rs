//! Treatment/group flags and the final completeness filter.

use crate::data::records::{FinalRecord, StandardizedRecord};
use chrono::NaiveDate;
use log::info;

pub fn after_event(week_start: NaiveDate, event_date: NaiveDate) -> bool {
    week_start >= event_date
}

pub struct Labeler;

impl Labeler {
    /// Label every complete row; rows missing attributes, earnings or a
    /// standardized index are dropped.
    pub fn label(records: Vec<StandardizedRecord>, event_date: NaiveDate) -> Vec<FinalRecord> {
        let total = records.len();
        let labeled: Vec<FinalRecord> = records
            .into_iter()
            .filter_map(|row| {
                let standardized_index = row.standardized_index?;
                let record = row.record;
                let attrs = record.attributes?;
                let reported_earnings = attrs.reported_earnings?;
                let earnings_class = attrs.earnings_class?;
                Some(FinalRecord {
                    institution_name: attrs.institution_name,
                    unit_id: attrs.unit_id,
                    operator_id: record.operator_id,
                    week_start: record.week_start,
                    total_index: record.total_index,
                    reported_earnings,
                    earnings_class,
                    standardized_index,
                    after_event: after_event(record.week_start, event_date),
                    high_earnings: earnings_class > 0,
                })
            })
            .collect();

        info!(
            "{} complete rows ready for estimation ({} incomplete dropped)",
            labeled.len(),
            total - labeled.len()
        );
        labeled
    }
}
