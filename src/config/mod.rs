//! Configuration management for surveyrs
//!
//! Settings come from built-in defaults, an optional YAML or TOML file and
//! `SURVEYRS_*` environment variables, in that order of precedence. The
//! command line overrides all of them.

use crate::core::error::{Error, Result};
use crate::stats::regression::PoissonOptions;
use crate::vis::DEFAULT_PALETTE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod loader;
pub mod validation;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Whitespace-delimited survey extract
    pub data_path: PathBuf,
    /// Directory receiving charts and CSV exports
    pub output_dir: PathBuf,
    /// Optional JSON report written after the run
    pub report_path: Option<PathBuf>,
    /// Chart rendering settings
    pub plots: PlotsConfig,
    /// Correlation permutation test settings
    pub permutation: PermutationConfig,
    /// Poisson regression solver settings
    pub regression: RegressionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Chart rendering section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotsConfig {
    /// Image width (pixels)
    pub width: u32,
    /// Image height (pixels)
    pub height: u32,
    /// Bins of the age histograms
    pub age_bins: usize,
    /// Points at which fitted densities are evaluated
    pub fit_points: usize,
    /// Age interval of the fitted density curves
    pub fit_range: (f64, f64),
    /// Marker opacity of the scatterplots
    pub scatter_alpha: f64,
    /// Marker radius of the scatterplots (pixels)
    pub scatter_radius: u32,
    /// Also print every chart to the terminal
    pub terminal_preview: bool,
    /// Series colours
    pub palette: Vec<(u8, u8, u8)>,
}

/// Permutation test section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermutationConfig {
    /// Number of permutations; more than one yields a p-value
    pub iterations: usize,
    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
}

/// Regression solver section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Newton-Raphson iteration limit
    pub max_iterations: usize,
    /// Convergence threshold on the largest parameter step
    pub tolerance: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (error, warn, info, debug, trace) or an env_logger spec
    pub level: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("gss_jan_23.dat"),
            output_dir: PathBuf::from("."),
            report_path: None,
            plots: PlotsConfig::default(),
            permutation: PermutationConfig::default(),
            regression: RegressionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PlotsConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            age_bins: 70,
            fit_points: 100,
            fit_range: (15.0, 90.0),
            scatter_alpha: 0.05,
            scatter_radius: 10,
            terminal_preview: false,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            seed: None,
        }
    }
}

impl Default for RegressionConfig {
    fn default() -> Self {
        let options = PoissonOptions::default();
        Self {
            max_iterations: options.max_iterations,
            tolerance: options.tolerance,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RegressionConfig {
    pub fn options(&self) -> PoissonOptions {
        PoissonOptions {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration with automatic discovery
    pub fn load() -> Result<Self> {
        loader::auto_load()
    }

    /// Load configuration from a specific file, then apply the environment
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        loader::load_with_precedence(Some(path))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        loader::save_to_file(self, path.as_ref())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to YAML: {}", e))
        })
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to TOML: {}", e))
        })
    }

    /// Path of a file inside the output directory
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Overlay every setting of `other` that differs from the defaults
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.data_path != defaults.data_path {
            self.data_path = other.data_path.clone();
        }
        if other.output_dir != defaults.output_dir {
            self.output_dir = other.output_dir.clone();
        }
        if other.report_path.is_some() {
            self.report_path = other.report_path.clone();
        }

        // Plots
        let (plots, base) = (&other.plots, &defaults.plots);
        if plots.width != base.width {
            self.plots.width = plots.width;
        }
        if plots.height != base.height {
            self.plots.height = plots.height;
        }
        if plots.age_bins != base.age_bins {
            self.plots.age_bins = plots.age_bins;
        }
        if plots.fit_points != base.fit_points {
            self.plots.fit_points = plots.fit_points;
        }
        if plots.fit_range != base.fit_range {
            self.plots.fit_range = plots.fit_range;
        }
        if plots.scatter_alpha != base.scatter_alpha {
            self.plots.scatter_alpha = plots.scatter_alpha;
        }
        if plots.scatter_radius != base.scatter_radius {
            self.plots.scatter_radius = plots.scatter_radius;
        }
        if plots.terminal_preview {
            self.plots.terminal_preview = true;
        }
        if plots.palette != base.palette {
            self.plots.palette = plots.palette.clone();
        }

        // Permutation test
        if other.permutation.iterations != defaults.permutation.iterations {
            self.permutation.iterations = other.permutation.iterations;
        }
        if other.permutation.seed.is_some() {
            self.permutation.seed = other.permutation.seed;
        }

        // Regression
        if other.regression.max_iterations != defaults.regression.max_iterations {
            self.regression.max_iterations = other.regression.max_iterations;
        }
        if other.regression.tolerance != defaults.regression.tolerance {
            self.regression.tolerance = other.regression.tolerance;
        }

        // Logging
        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level.clone();
        }
    }
}
