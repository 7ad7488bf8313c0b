//! Report Generator Module
//! Renders the analysis as a Markdown text report and an optional JSON summary.

use crate::pipeline::AnalysisResult;
use crate::stats::CrossTab;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct ReportGenerator;

impl ReportGenerator {
    /// Render the full human-readable report.
    pub fn render_markdown(result: &AnalysisResult) -> String {
        let mut out = String::new();
        let counts = &result.counts;

        let _ = writeln!(out, "# College Scorecard and search interest\n");
        let _ = writeln!(
            out,
            "Event date: {}  \nEarnings threshold: {:.0}\n",
            result.event_date, result.earnings_threshold
        );

        let _ = writeln!(out, "## Pipeline\n");
        let _ = writeln!(out, "| Stage | Rows |");
        let _ = writeln!(out, "|---|---:|");
        for (stage, rows) in [
            ("Search rows loaded", counts.search_rows),
            ("Outcome rows loaded", counts.outcome_rows),
            ("Name links loaded", counts.name_links),
            ("Name links with unique names", counts.unique_name_links),
            ("Outcomes of target degree", counts.target_outcomes),
            ("Joined search rows", counts.joined_rows),
            ("Rows with unparseable period", counts.malformed_period_rows),
            ("Institution-weeks", counts.weekly_rows),
            ("Institution-weeks without attributes", counts.weeks_without_attributes),
            ("Institution-weeks without z-score", counts.undefined_standardized),
            ("Complete rows", counts.final_rows),
        ] {
            let _ = writeln!(out, "| {} | {} |", stage, rows);
        }
        out.push('\n');

        Self::render_cross_tab(&mut out, &result.cross_tab);

        let _ = writeln!(out, "## Regression: standardized_index ~ after_event * high_earnings\n");
        match (&result.regression, &result.regression_error) {
            (Some(summary), _) => {
                let _ = writeln!(out, "| Term | Estimate | Std. Error | t value | p value | |");
                let _ = writeln!(out, "|---|---:|---:|---:|---:|---|");
                for c in &summary.coefficients {
                    let _ = writeln!(
                        out,
                        "| {} | {:.4} | {:.4} | {:.3} | {} | {} |",
                        c.term,
                        c.estimate,
                        c.std_error,
                        c.t_value,
                        format_p_value(c.p_value),
                        c.significance()
                    );
                }
                let _ = writeln!(
                    out,
                    "\nSignif. codes: 0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1\n"
                );
                let _ = writeln!(
                    out,
                    "Residual standard error: {:.4} on {} degrees of freedom  \n\
                     Multiple R-squared: {:.4}, Adjusted R-squared: {:.4}  \n\
                     Observations: {}",
                    summary.residual_std_error,
                    summary.residual_df,
                    summary.r_squared,
                    summary.adj_r_squared,
                    summary.observations
                );
            }
            (None, Some(reason)) => {
                let _ = writeln!(out, "Model not estimable: {}", reason);
            }
            (None, None) => {
                let _ = writeln!(out, "Model not estimated.");
            }
        }
        out
    }

    fn render_cross_tab(out: &mut String, table: &CrossTab) {
        let _ = writeln!(out, "## Mean standardized index\n");
        let _ = writeln!(out, "| after_event | high_earnings | n | mean |");
        let _ = writeln!(out, "|---|---|---:|---:|");
        for cell in &table.cells {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                cell.after_event,
                cell.high_earnings,
                cell.count,
                format_float(cell.mean_standardized_index, 4)
            );
        }
        let _ = writeln!(
            out,
            "\nDouble difference: {}\n",
            format_float(table.double_difference, 4)
        );
    }

    pub fn write_report(path: &Path, text: &str) -> Result<(), ReportError> {
        fs::write(path, text).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_summary_json(path: &Path, result: &AnalysisResult) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(result)?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn format_float(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        "-".to_string()
    }
}

fn format_p_value(p: f64) -> String {
    if !p.is_finite() {
        "-".to_string()
    } else if p < 2e-16 {
        "<2e-16".to_string()
    } else if p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.4}", p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_p_value() {
        assert_eq!(format_p_value(0.04321), "0.0432");
        assert_eq!(format_p_value(1e-20), "<2e-16");
        assert_eq!(format_p_value(f64::NAN), "-");
        assert!(format_p_value(3.5e-6).contains('e'));
    }

    #[test]
    fn test_format_float_hides_nan() {
        assert_eq!(format_float(f64::NAN, 3), "-");
        assert_eq!(format_float(1.23456, 3), "1.235");
    }
}
