//! Weekly aggregation of per-keyword search rows.

use crate::data::records::{JoinedRecord, WeeklyAggregate};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::{debug, info};
use std::collections::BTreeMap;

const DATE_PREFIX_LEN: usize = 10;

/// Parse the leading `YYYY-MM-DD` of a period label such as `2015-08-30 - 2015-09-05`.
pub fn period_start(label: &str) -> Option<NaiveDate> {
    let prefix = label.trim_start().get(..DATE_PREFIX_LEN)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Round `date` down to the most recent `week_start`.
pub fn floor_to_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (date.weekday().num_days_from_sunday() + 7 - week_start.num_days_from_sunday()) % 7;
    date - Duration::days(i64::from(offset))
}

/// Aggregation result, including how many rows had unusable period labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub weekly: Vec<WeeklyAggregate>,
    pub malformed_rows: usize,
}

/// Collapses keyword rows into one total per institution and week.
pub struct Aggregator;

impl Aggregator {
    /// Sum `search_index` per `(operator_id, week)`; missing values count as zero.
    ///
    /// Output is sorted by operator id, then week.
    pub fn weekly_totals(rows: &[JoinedRecord], week_start: Weekday) -> Aggregation {
        let mut totals: BTreeMap<(i64, NaiveDate), f64> = BTreeMap::new();
        let mut malformed_rows = 0usize;

        for row in rows {
            let Some(start) = period_start(&row.period_label) else {
                malformed_rows += 1;
                continue;
            };
            let week = floor_to_week(start, week_start);
            *totals.entry((row.operator_id, week)).or_insert(0.0) += row.search_index.unwrap_or(0.0);
        }

        if malformed_rows > 0 {
            debug!("Excluded {} rows with unparseable period labels", malformed_rows);
        }

        let weekly: Vec<WeeklyAggregate> = totals
            .into_iter()
            .map(|((operator_id, week_start), total_index)| WeeklyAggregate {
                operator_id,
                week_start,
                total_index,
            })
            .collect();

        info!("Aggregated {} rows into {} institution-weeks", rows.len(), weekly.len());
        Aggregation {
            weekly,
            malformed_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(operator_id: i64, label: &str, index: Option<f64>) -> JoinedRecord {
        JoinedRecord {
            institution_name: "Acme College".to_string(),
            unit_id: 1,
            operator_id,
            keyword: "acme".to_string(),
            period_label: label.to_string(),
            search_index: index,
            predominant_degree: None,
            reported_earnings: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_start_reads_leading_date() {
        assert_eq!(period_start("2015-08-30 - 2015-09-05"), Some(date(2015, 8, 30)));
        assert_eq!(period_start("2015-13-01 - 2015-13-07"), None);
        assert_eq!(period_start("week 12"), None);
        assert_eq!(period_start(""), None);
    }

    #[test]
    fn test_floor_to_week_sunday() {
        // 2015-09-05 is a Saturday.
        assert_eq!(floor_to_week(date(2015, 9, 5), Weekday::Sun), date(2015, 8, 30));
        assert_eq!(floor_to_week(date(2015, 8, 30), Weekday::Sun), date(2015, 8, 30));
        assert_eq!(floor_to_week(date(2015, 9, 5), Weekday::Mon), date(2015, 8, 31));
    }

    #[test]
    fn test_missing_index_counts_as_zero() {
        let rows = vec![
            row(10, "2015-08-30 - 2015-09-05", Some(10.0)),
            row(10, "2015-08-30 - 2015-09-05", None),
        ];
        let agg = Aggregator::weekly_totals(&rows, Weekday::Sun);
        assert_eq!(agg.weekly.len(), 1);
        assert_eq!(agg.weekly[0].total_index, 10.0);
        assert_eq!(agg.weekly[0].week_start, date(2015, 8, 30));
    }

    #[test]
    fn test_one_row_per_institution_week() {
        let rows = vec![
            row(20, "2015-08-30 - 2015-09-05", Some(1.0)),
            row(10, "2015-08-30 - 2015-09-05", Some(2.0)),
            row(10, "2015-09-06 - 2015-09-12", Some(3.0)),
            row(10, "2015-08-30 - 2015-09-05", Some(4.0)),
            row(10, "garbage", Some(100.0)),
        ];
        let agg = Aggregator::weekly_totals(&rows, Weekday::Sun);
        assert_eq!(agg.malformed_rows, 1);
        let keys: Vec<_> = agg.weekly.iter().map(|w| (w.operator_id, w.week_start)).collect();
        assert_eq!(
            keys,
            vec![
                (10, date(2015, 8, 30)),
                (10, date(2015, 9, 6)),
                (20, date(2015, 8, 30)),
            ]
        );
        assert_eq!(agg.weekly[0].total_index, 6.0);
        assert_eq!(agg.weekly[1].total_index, 3.0);
        assert_eq!(agg.weekly[2].total_index, 1.0);
    }
}
