//! Configuration and command line tests

use clap::Parser;
use surveyrs::cli::Cli;
use surveyrs::config::loader::*;
use surveyrs::config::validation::*;
use surveyrs::config::*;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = AnalysisConfig::default();

    assert_eq!(config.plots.age_bins, 70);
    assert_eq!(config.plots.fit_points, 100);
    assert_eq!(config.permutation.iterations, 1);
    assert_eq!(config.regression.max_iterations, 35);
    assert_eq!(config.logging.level, "info");

    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_serialization() {
    let config = AnalysisConfig::default();

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("plots:"));
    assert!(yaml.contains("permutation:"));

    let toml = config.to_toml().unwrap();
    assert!(toml.contains("[plots]"));
    assert!(toml.contains("[regression]"));
}

#[test]
fn test_file_round_trip() {
    let dir = tempdir().unwrap();

    let mut config = AnalysisConfig::default();
    config.data_path = "survey/GSS.dat".into();
    config.plots.scatter_alpha = 0.2;
    config.permutation.seed = Some(7);

    for name in ["analysis.yaml", "analysis.toml"] {
        let path = dir.path().join(name);
        config.save_to_file(&path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded, config, "round trip through {}", name);
    }
}

#[test]
fn test_partial_file_keeps_defaults() {
    let yaml = r#"
data_path: other.dat
plots:
  age_bins: 35
"#;
    let config = load_from_yaml(yaml).unwrap();
    assert_eq!(config.data_path.to_str(), Some("other.dat"));
    assert_eq!(config.plots.age_bins, 35);
    assert_eq!(config.plots.width, 800);
    assert_eq!(config.regression.tolerance, 1e-8);
}

#[test]
fn test_invalid_files_are_rejected() {
    let dir = tempdir().unwrap();

    let unsupported = dir.path().join("analysis.ini");
    std::fs::write(&unsupported, "data_path = x").unwrap();
    assert!(load_from_file(&unsupported).is_err());

    assert!(load_from_file(&dir.path().join("missing.yaml")).is_err());
    assert!(load_from_yaml("plots: [1, 2").is_err());
}

#[test]
fn test_config_validation() {
    let mut config = AnalysisConfig::default();
    config.plots.fit_range = (90.0, 15.0);
    assert!(validate_config(&config).is_err());

    let mut config = AnalysisConfig::default();
    config.permutation.iterations = 0;
    assert!(config.validate().is_err());

    let mut config = AnalysisConfig::default();
    config.regression.tolerance = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_cli_overrides_config() {
    let cli = Cli::parse_from([
        "surveyrs",
        "data/GSS.dat",
        "--output-dir",
        "charts",
        "--seed",
        "11",
        "--permutations",
        "1000",
        "--terminal-plots",
        "--report",
        "charts/report.json",
    ]);

    let mut config = AnalysisConfig::default();
    cli.apply(&mut config);

    assert_eq!(config.data_path.to_str(), Some("data/GSS.dat"));
    assert_eq!(config.output_dir.to_str(), Some("charts"));
    assert_eq!(config.permutation.seed, Some(11));
    assert_eq!(config.permutation.iterations, 1000);
    assert!(config.plots.terminal_preview);
    assert_eq!(
        config.report_path.as_deref().and_then(|p| p.to_str()),
        Some("charts/report.json")
    );
}

#[test]
fn test_cli_without_arguments_keeps_config() {
    let cli = Cli::parse_from(["surveyrs"]);
    let mut config = AnalysisConfig::default();
    config.plots.age_bins = 20;
    cli.apply(&mut config);
    assert_eq!(config.plots.age_bins, 20);
    assert_eq!(config.data_path, AnalysisConfig::default().data_path);
}
