//! End-to-end pipeline tests
//!
//! Runs the complete analysis on a synthetic extract laid out like the GSS
//! data file and checks the report and the files it produces.

use std::fs;
use std::io::Write;
use std::path::Path;

use surveyrs::config::AnalysisConfig;
use surveyrs::io::read_dat;
use surveyrs::pipeline::{prepare_frame, regression_formulas, AnalysisReport};
use surveyrs::stats::DistributionFamily;
use surveyrs::survey::{gss_schema, HOW_CONSERVATIVE, RESP_AGE, SHOULD_FUND_EDUCATION};
use tempfile::tempdir;

const FIELDS: usize = 26;
const VALID_ROWS: usize = 240;

fn record(fund: i64, edu: i64, age: i64, income: i64, cons: i64, id: usize) -> String {
    let mut fields = vec!["0".to_string(); FIELDS];
    fields[0] = id.to_string();
    fields[7] = fund.to_string();
    fields[13] = edu.to_string();
    fields[20] = age.to_string();
    fields[23] = income.to_string();
    fields[24] = cons.to_string();
    fields.join("  ")
}

/// 240 answered rows followed by 10 rows carrying non-response codes
fn write_fixture(path: &Path) {
    let mut file = fs::File::create(path).unwrap();
    for i in 0..VALID_ROWS {
        let fund = (i % 3 + 1) as i64;
        let edu = ((i / 3) % 3 + 1) as i64;
        let age = 18 + ((i * 37) % 70) as i64;
        let income = ((i * 5) % 12 + 1) as i64;
        let cons = ((i * 11 + i / 7) % 7 + 1) as i64;
        writeln!(file, "{}", record(fund, edu, age, income, cons, i)).unwrap();
    }

    let sentinel_rows = [
        (1, 1, 99, 5, 4),
        (2, 2, 98, 6, 3),
        (3, 3, 89, 7, 2),
        (1, 2, 99, 8, 1),
        (2, 3, 98, 9, 5),
        (9, 1, 40, 3, 6),
        (9, 2, 41, 4, 7),
        (1, 0, 42, 5, 4),
        (2, 3, 43, 98, 2),
        (3, 1, 44, 2, 8),
    ];
    for (offset, (fund, edu, age, income, cons)) in sentinel_rows.iter().enumerate() {
        writeln!(
            file,
            "{}",
            record(*fund, *edu, *age, *income, *cons, VALID_ROWS + offset)
        )
        .unwrap();
    }
}

fn test_config(dir: &Path) -> AnalysisConfig {
    let data_path = dir.join("GSS.dat");
    write_fixture(&data_path);

    let mut config = AnalysisConfig::default();
    config.data_path = data_path;
    config.output_dir = dir.join("out");
    config.report_path = Some(dir.join("out").join("report.json"));
    config.permutation.seed = Some(42);
    config.permutation.iterations = 50;
    config
}

#[test]
fn test_fixture_cleaning() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let specs = gss_schema();
    let raw = read_dat(&config.data_path, &specs).unwrap();
    assert_eq!(raw.row_count(), VALID_ROWS + 10);
    assert_eq!(raw.column_count(), 5);

    let (df, rows) = prepare_frame(raw, &specs).unwrap();
    assert_eq!(rows.loaded, VALID_ROWS + 10);
    assert_eq!(rows.dropped_sentinels, 10);
    assert_eq!(rows.dropped_missing, 0);
    assert_eq!(rows.analyzed, VALID_ROWS);
    assert_eq!(df.row_count(), VALID_ROWS);

    let ages = df.numeric_values(RESP_AGE).unwrap();
    assert!(ages.iter().all(|&a| (18.0..88.0).contains(&a)));
}

#[test]
fn test_full_run() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let report = surveyrs::run(&config).unwrap();

    assert_eq!(report.rows.analyzed, VALID_ROWS);
    assert_eq!(report.summaries.len(), 5);
    assert!(report.pmf_groups.liberal > 0);
    assert!(report.pmf_groups.conservative > 0);

    // Distribution fits
    let families: Vec<DistributionFamily> = report.fits.iter().map(|f| f.family).collect();
    assert_eq!(
        families,
        vec![
            DistributionFamily::Gamma,
            DistributionFamily::Alpha,
            DistributionFamily::Rice
        ]
    );
    assert!(report.fits.iter().all(|f| f.log_likelihood.is_finite()));

    // Correlation matrix
    assert_eq!(report.correlation.columns.len(), 5);
    assert_eq!(
        report.correlation.get(HOW_CONSERVATIVE, SHOULD_FUND_EDUCATION),
        Some(report.permutation.observed_rho)
    );

    // Permutation test
    assert_eq!(report.permutation.iterations, 50);
    assert!(report.permutation.permuted_rho.abs() <= 1.0);
    let p = report.permutation.p_value.unwrap();
    assert!(p > 0.0 && p <= 1.0);

    // Regressions
    let formulas: Vec<String> = report.regressions.iter().map(|r| r.formula.clone()).collect();
    assert_eq!(formulas, regression_formulas());
    assert_eq!(report.regressions.len(), 5);
    for results in &report.regressions {
        assert!(results.converged);
        assert_eq!(results.nobs, VALID_ROWS);
        assert!(results.llf <= 0.0);
        assert!(results.params.iter().all(|p| p.is_finite()));
    }
    assert_eq!(report.regressions[4].df_model, 4);

    // Exports
    for name in ["cleaned.csv", "spearman_rho.csv", "spearman_p.csv", "report.json"] {
        assert!(config.output_path(name).exists(), "missing {}", name);
    }
    let cleaned = fs::read_to_string(config.output_path("cleaned.csv")).unwrap();
    assert_eq!(cleaned.lines().count(), VALID_ROWS + 1);
}

#[cfg(feature = "visualization")]
#[test]
fn test_full_run_writes_charts() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let report = surveyrs::run(&config).unwrap();
    assert!(report.skipped_charts.is_empty());

    for name in [
        "how_fundamentalist.png",
        "should_fund_education.png",
        "resp_age.png",
        "total_family_income.png",
        "how_conservative.png",
        "age_pmf.png",
        "conservatism_cdf.png",
        "age_fits.png",
        "conservatism_vs_age.png",
        "income_vs_age.png",
    ] {
        let path = config.output_path(name);
        assert!(path.exists(), "missing {}", name);
        assert!(report.outputs.contains(&path));
    }
}

#[test]
fn test_report_round_trip() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let report = surveyrs::run(&config).unwrap();
    let path = config.report_path.clone().unwrap();
    let json = fs::read_to_string(&path).unwrap();
    let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.rows, report.rows);
    assert_eq!(parsed.regressions.len(), report.regressions.len());
    assert_eq!(parsed.permutation.iterations, report.permutation.iterations);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.report_path = None;

    let first = surveyrs::run(&config).unwrap();
    let second = surveyrs::run(&config).unwrap();
    assert_eq!(first.permutation.permuted_rho, second.permutation.permuted_rho);
    assert_eq!(first.permutation.p_value, second.permutation.p_value);
}

#[test]
fn test_missing_data_file_is_an_error() {
    let dir = tempdir().unwrap();
    let mut config = AnalysisConfig::default();
    config.data_path = dir.path().join("absent.dat");
    config.output_dir = dir.path().join("out");

    assert!(surveyrs::run(&config).is_err());
}
