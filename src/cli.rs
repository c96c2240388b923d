use clap::Parser;
use std::path::PathBuf;

use crate::config::AnalysisConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "surveyrs")]
#[command(about = "Exploratory statistical analysis of a General Social Survey extract", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Whitespace-delimited survey data file
    pub data_file: Option<PathBuf>,

    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "SURVEYRS_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Directory for charts and CSV exports
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seed for the permutation test
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of permutations (more than one reports a p-value)
    #[arg(long)]
    pub permutations: Option<usize>,

    /// Print a text rendering of every chart
    #[arg(long)]
    pub terminal_plots: bool,

    /// Write a JSON report of all results
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Command line values take precedence over every other source
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(path) = &self.data_file {
            config.data_path = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.permutation.seed = Some(seed);
        }
        if let Some(n) = self.permutations {
            config.permutation.iterations = n;
        }
        if self.terminal_plots {
            config.plots.terminal_preview = true;
        }
        if let Some(report) = &self.report {
            config.report_path = Some(report.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_apply() {
        let cli = Cli::try_parse_from([
            "surveyrs",
            "data.dat",
            "--output-dir",
            "out",
            "--seed",
            "9",
            "--permutations",
            "100",
            "--terminal-plots",
            "--report",
            "report.json",
        ])
        .unwrap();

        let mut config = AnalysisConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.data_path, PathBuf::from("data.dat"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.permutation.seed, Some(9));
        assert_eq!(config.permutation.iterations, 100);
        assert!(config.plots.terminal_preview);
        assert_eq!(config.report_path, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_no_arguments_keep_config() {
        let mut config = AnalysisConfig::default();
        config.permutation.seed = Some(3);
        Cli::default().apply(&mut config);
        assert_eq!(config, {
            let mut expected = AnalysisConfig::default();
            expected.permutation.seed = Some(3);
            expected
        });
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(Cli::try_parse_from(["surveyrs", "--seed", "abc"]).is_err());
    }
}
