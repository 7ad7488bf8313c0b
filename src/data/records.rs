//! Per-stage record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Predominant degree awarded, as coded in the outcomes file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredominantDegree {
    NotClassified,
    Certificate,
    Associate,
    Bachelors,
    Graduate,
}

impl PredominantDegree {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotClassified),
            1 => Some(Self::Certificate),
            2 => Some(Self::Associate),
            3 => Some(Self::Bachelors),
            4 => Some(Self::Graduate),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::NotClassified => 0,
            Self::Certificate => 1,
            Self::Associate => 2,
            Self::Bachelors => 3,
            Self::Graduate => 4,
        }
    }
}

impl Default for PredominantDegree {
    fn default() -> Self {
        PredominantDegree::Bachelors
    }
}

/// One row of the name-to-identifier crosswalk.
#[derive(Debug, Clone, PartialEq)]
pub struct NameLink {
    pub institution_name: String,
    pub unit_id: i64,
    pub operator_id: i64,
}

/// One keyword's search interest for one institution and week.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecord {
    pub institution_name: String,
    pub keyword: String,
    pub period_label: String,
    pub search_index: Option<f64>,
}

/// One institution's row in the outcomes table.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub unit_id: i64,
    pub operator_id: i64,
    pub predominant_degree: Option<PredominantDegree>,
    pub reported_earnings: Option<f64>,
}

/// Search row with identifiers and outcomes attached.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub institution_name: String,
    pub unit_id: i64,
    pub operator_id: i64,
    pub keyword: String,
    pub period_label: String,
    pub search_index: Option<f64>,
    pub predominant_degree: Option<PredominantDegree>,
    pub reported_earnings: Option<f64>,
}

/// Summed search interest for one institution and week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAggregate {
    pub operator_id: i64,
    pub week_start: NaiveDate,
    pub total_index: f64,
}

/// Attributes restored after aggregation, one per operator id.
#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionAttributes {
    pub operator_id: i64,
    pub unit_id: i64,
    pub institution_name: String,
    pub predominant_degree: Option<PredominantDegree>,
    pub reported_earnings: Option<f64>,
    /// `1` when earnings meet the threshold, `0` below it, `None` if unreported.
    pub earnings_class: Option<u8>,
}

/// Weekly aggregate with its (possibly missing) attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedRecord {
    pub operator_id: i64,
    pub week_start: NaiveDate,
    pub total_index: f64,
    pub attributes: Option<InstitutionAttributes>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedRecord {
    pub record: ReconstructedRecord,
    pub standardized_index: Option<f64>,
}

/// Complete, regression-ready row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalRecord {
    pub institution_name: String,
    pub unit_id: i64,
    pub operator_id: i64,
    pub week_start: NaiveDate,
    pub total_index: f64,
    pub reported_earnings: f64,
    pub earnings_class: u8,
    pub standardized_index: f64,
    pub after_event: bool,
    pub high_earnings: bool,
}
