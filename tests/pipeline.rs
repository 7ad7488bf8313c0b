use chrono::NaiveDate;
use scorecard_trends::data::LoaderError;
use scorecard_trends::report::ReportGenerator;
use scorecard_trends::{AnalysisConfig, Pipeline, PipelineError};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WEEKS: [&str; 8] = [
    "2015-08-02 - 2015-08-08",
    "2015-08-09 - 2015-08-15",
    "2015-08-16 - 2015-08-22",
    "2015-08-23 - 2015-08-29",
    "2015-08-30 - 2015-09-05",
    "2015-09-06 - 2015-09-12",
    "2015-09-13 - 2015-09-19",
    "2015-09-20 - 2015-09-26",
];

/// (name, high earnings) for every searched institution.
const SEARCHED: [(&str, bool); 8] = [
    ("Alpha University", true),
    ("Beta College", false),
    ("Gamma Institute", true),
    ("Delta College", false),
    ("Twin College", true),
    ("Epsilon College", false),
    ("Zeta College", false),
    ("Mismatch College", true),
];

fn search_rows(institutions: &[(usize, &str, bool)]) -> String {
    let mut out = String::from("schname,keyword,monthorweek,keynum,index\n");
    for &(k, name, high) in institutions {
        for (w, week) in WEEKS.iter().enumerate() {
            for j in 0..2 {
                let mut index = 10.0 * (k as f64 + 1.0) + (w * w % 5) as f64 + 3.0 * j as f64;
                if high && w >= 5 {
                    index += 20.0;
                }
                out.push_str(&format!(
                    "{},{} {},{},{},{}\n",
                    name,
                    name.to_lowercase(),
                    j,
                    week,
                    j + 1,
                    index
                ));
            }
        }
    }
    out
}

fn write_fixtures(dir: &Path) {
    let searched: Vec<(usize, &str, bool)> = SEARCHED
        .iter()
        .enumerate()
        .map(|(k, &(name, high))| (k, name, high))
        .collect();
    let (first, second) = searched.split_at(4);

    let mut first_file = search_rows(first);
    first_file.push_str("Alpha University,alpha extra,2015-08-02 - 2015-08-08,3,\n");
    first_file.push_str("Alpha University,alpha broken,not a week,4,999\n");
    fs::write(dir.join("trends_up_to_a.csv"), first_file).unwrap();
    fs::write(dir.join("trends_up_to_b.csv"), search_rows(second)).unwrap();

    fs::write(
        dir.join("id_name_link.csv"),
        "schname,unitid,opeid\n\
         Alpha University,1,100\n\
         Beta College,2,200\n\
         Gamma Institute,3,300\n\
         Delta College,4,400\n\
         Twin College,5,500\n\
         Twin College,6,600\n\
         Epsilon College,7,700\n\
         Zeta College,8,800\n\
         Mismatch College,9,900\n",
    )
    .unwrap();

    fs::write(
        dir.join("scorecard.csv"),
        "UNITID,OPEID,INSTNM,PREDDEG,md_earn_wne_p10-REPORTED-EARNINGS\n\
         1,100,Alpha University,3,61000\n\
         2,200,Beta College,3,32000\n\
         3,300,Gamma Institute,3,55000\n\
         4,400,Delta College,3,36000\n\
         5,500,Twin College,3,70000\n\
         6,600,Twin College,3,70000\n\
         7,700,Epsilon College,2,45000\n\
         8,800,Zeta College,3,PrivacySuppressed\n\
         99,900,Mismatch College,3,80000\n",
    )
    .unwrap();
}

fn config_for(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: dir.to_path_buf(),
        outcomes_file: "scorecard.csv".into(),
        earnings_threshold: 50_000.0,
        event_date: NaiveDate::from_ymd_opt(2015, 9, 1).unwrap(),
        ..AnalysisConfig::default()
    }
}

fn fixture() -> (TempDir, AnalysisConfig) {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let config = config_for(dir.path());
    (dir, config)
}

#[test]
fn test_full_pipeline_counts_and_filters() {
    let (_dir, config) = fixture();
    let result = Pipeline::run(&config).unwrap();
    let counts = &result.counts;

    assert_eq!(counts.name_links, 9);
    assert_eq!(counts.unique_name_links, 7);
    assert_eq!(counts.target_outcomes, 8);
    assert_eq!(counts.malformed_period_rows, 1);
    // Alpha, Beta, Gamma, Delta and Zeta survive the composite join.
    assert_eq!(counts.weekly_rows, 5 * WEEKS.len());
    assert_eq!(counts.final_rows, 4 * WEEKS.len());

    let names: HashSet<&str> = result
        .records
        .iter()
        .map(|r| r.institution_name.as_str())
        .collect();
    let expected: HashSet<&str> =
        ["Alpha University", "Beta College", "Gamma Institute", "Delta College"]
            .into_iter()
            .collect();
    assert_eq!(names, expected);
}

#[test]
fn test_missing_index_and_bad_labels_do_not_change_totals() {
    let (_dir, config) = fixture();
    let result = Pipeline::run(&config).unwrap();
    let first_week = NaiveDate::from_ymd_opt(2015, 8, 2).unwrap();
    let alpha = result
        .records
        .iter()
        .find(|r| r.operator_id == 100 && r.week_start == first_week)
        .unwrap();
    // keyword 0: 10, keyword 1: 13; the missing index adds nothing.
    assert_eq!(alpha.total_index, 23.0);
}

#[test]
fn test_labels_and_standardization() {
    let (_dir, config) = fixture();
    let result = Pipeline::run(&config).unwrap();

    for record in &result.records {
        assert_eq!(record.after_event, record.week_start >= config.event_date);
        assert_eq!(record.high_earnings, record.reported_earnings >= 50_000.0);
    }

    for operator_id in [100, 200, 300, 400] {
        let z: Vec<f64> = result
            .records
            .iter()
            .filter(|r| r.operator_id == operator_id)
            .map(|r| r.standardized_index)
            .collect();
        let n = z.len() as f64;
        let mean = z.iter().sum::<f64>() / n;
        let sd = (z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        assert!(mean.abs() < 0.01, "mean {} for {}", mean, operator_id);
        assert!((sd - 1.0).abs() < 0.01, "sd {} for {}", sd, operator_id);
    }
}

#[test]
fn test_regression_matches_double_difference() {
    let (_dir, config) = fixture();
    let result = Pipeline::run(&config).unwrap();

    let summary = result.regression.as_ref().expect("model should be estimable");
    assert_eq!(summary.observations, 4 * WEEKS.len());
    assert_eq!(summary.coefficients.len(), 4);

    let interaction = summary.interaction().unwrap();
    assert!((interaction.estimate - result.cross_tab.double_difference).abs() < 1e-9);
    assert!(interaction.estimate > 0.0);
}

#[test]
fn test_rerun_is_deterministic() {
    let (_dir, config) = fixture();
    let first = Pipeline::run(&config).unwrap();
    let second = Pipeline::run(&config).unwrap();

    let a = first.regression.unwrap();
    let b = second.regression.unwrap();
    for (x, y) in a.coefficients.iter().zip(&b.coefficients) {
        assert_eq!(x.estimate.to_bits(), y.estimate.to_bits());
        assert_eq!(x.std_error.to_bits(), y.std_error.to_bits());
    }
    assert_eq!(first.records, second.records);
}

#[test]
fn test_report_and_summary_outputs() {
    let (dir, mut config) = fixture();
    config.output.report_path = Some(dir.path().join("report.md"));
    config.output.summary_path = Some(dir.path().join("summary.json"));
    config.output.chart_path = Some(dir.path().join("trend.png"));

    let result = Pipeline::run(&config).unwrap();
    let text = ReportGenerator::render_markdown(&result);
    Pipeline::write_outputs(&result, &config, &text).unwrap();

    let report = fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(report.contains("after_event:high_earnings"));
    assert!(report.contains("Double difference"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["counts"]["final_rows"], 4 * WEEKS.len());
    assert_eq!(summary["regression"]["coefficients"].as_array().unwrap().len(), 4);

    let chart = fs::metadata(dir.path().join("trend.png")).unwrap();
    assert!(chart.len() > 0);
}

#[test]
fn test_unmatched_inputs_give_empty_but_valid_result() {
    let (dir, config) = fixture();
    fs::write(
        dir.path().join("scorecard.csv"),
        "UNITID,OPEID,PREDDEG,md_earn_wne_p10-REPORTED-EARNINGS\n42,4200,3,50000\n",
    )
    .unwrap();

    let result = Pipeline::run(&config).unwrap();
    assert_eq!(result.counts.joined_rows, 0);
    assert!(result.records.is_empty());
    assert!(result.regression.is_none());
    assert!(result.regression_error.is_some());
    let report = ReportGenerator::render_markdown(&result);
    assert!(report.contains("Model not estimable"));
}

#[test]
fn test_missing_input_file_is_fatal() {
    let (dir, config) = fixture();
    fs::remove_file(dir.path().join("id_name_link.csv")).unwrap();
    let err = Pipeline::run(&config).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Loader(LoaderError::MissingFile(_))
    ));
}
