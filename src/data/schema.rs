//! Canonical column names.
//!
//! Every header is lower-cased once at load time, so the constants below are
//! the only column names the rest of the crate ever refers to.

/// Institution name, shared by the search files and the name-link file.
pub const INSTITUTION_NAME: &str = "schname";
/// Search keyword.
pub const KEYWORD: &str = "keyword";
/// Week label, e.g. `2015-08-30 - 2015-09-05`.
pub const PERIOD_LABEL: &str = "monthorweek";
/// Search interest index.
pub const SEARCH_INDEX: &str = "index";
/// IPEDS unit id.
pub const UNIT_ID: &str = "unitid";
/// OPE id (operator id).
pub const OPERATOR_ID: &str = "opeid";
/// Predominant degree code.
pub const PREDOMINANT_DEGREE: &str = "preddeg";

pub const SEARCH_COLUMNS: [&str; 4] = [INSTITUTION_NAME, KEYWORD, PERIOD_LABEL, SEARCH_INDEX];
pub const NAME_LINK_COLUMNS: [&str; 3] = [INSTITUTION_NAME, UNIT_ID, OPERATOR_ID];
pub const OUTCOME_KEY_COLUMNS: [&str; 3] = [UNIT_ID, OPERATOR_ID, PREDOMINANT_DEGREE];

/// Fold a raw header into the canonical convention.
pub fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}
