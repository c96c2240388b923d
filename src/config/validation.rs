//! Configuration validation utilities

use super::*;
use crate::core::error::{Error, Result};

/// Validate the entire configuration
pub fn validate_config(config: &AnalysisConfig) -> Result<()> {
    if config.data_path.as_os_str().is_empty() {
        return Err(Error::ConfigurationError(
            "data_path must not be empty".to_string(),
        ));
    }

    validate_plots_config(&config.plots)?;
    validate_permutation_config(&config.permutation)?;
    validate_regression_config(&config.regression)?;
    validate_logging_config(&config.logging)?;

    Ok(())
}

/// Validate chart settings
pub fn validate_plots_config(config: &PlotsConfig) -> Result<()> {
    if config.width == 0 || config.height == 0 {
        return Err(Error::ConfigurationError(format!(
            "Plot dimensions must be positive, got {}x{}",
            config.width, config.height
        )));
    }

    if config.age_bins == 0 {
        return Err(Error::ConfigurationError(
            "age_bins must be greater than 0".to_string(),
        ));
    }

    if config.fit_points < 2 {
        return Err(Error::ConfigurationError(
            "fit_points must be at least 2".to_string(),
        ));
    }

    let (lo, hi) = config.fit_range;
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(Error::ConfigurationError(format!(
            "fit_range must be a finite, increasing interval, got [{}, {}]",
            lo, hi
        )));
    }

    if !(config.scatter_alpha > 0.0 && config.scatter_alpha <= 1.0) {
        return Err(Error::ConfigurationError(format!(
            "scatter_alpha must be in (0, 1], got {}",
            config.scatter_alpha
        )));
    }

    Ok(())
}

/// Validate permutation test settings
pub fn validate_permutation_config(config: &PermutationConfig) -> Result<()> {
    if config.iterations == 0 {
        return Err(Error::ConfigurationError(
            "permutation iterations must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate regression solver settings
pub fn validate_regression_config(config: &RegressionConfig) -> Result<()> {
    if config.max_iterations == 0 {
        return Err(Error::ConfigurationError(
            "regression max_iterations must be greater than 0".to_string(),
        ));
    }

    if !(config.tolerance > 0.0 && config.tolerance.is_finite()) {
        return Err(Error::ConfigurationError(format!(
            "regression tolerance must be positive, got {}",
            config.tolerance
        )));
    }

    Ok(())
}

/// Validate logging configuration
pub fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        return Err(Error::ConfigurationError(
            "logging level must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_validation() {
        let mut plots = PlotsConfig::default();
        assert!(validate_plots_config(&plots).is_ok());

        plots.width = 0;
        assert!(validate_plots_config(&plots).is_err());

        let mut plots = PlotsConfig::default();
        plots.age_bins = 0;
        assert!(validate_plots_config(&plots).is_err());

        let mut plots = PlotsConfig::default();
        plots.fit_range = (90.0, 15.0);
        assert!(validate_plots_config(&plots).is_err());

        let mut plots = PlotsConfig::default();
        plots.fit_range = (15.0, 15.0);
        assert!(validate_plots_config(&plots).is_err());

        for alpha in [0.0, -0.1, 1.5, f64::NAN] {
            let mut plots = PlotsConfig::default();
            plots.scatter_alpha = alpha;
            assert!(validate_plots_config(&plots).is_err(), "alpha {}", alpha);
        }

        let mut plots = PlotsConfig::default();
        plots.scatter_alpha = 1.0;
        assert!(validate_plots_config(&plots).is_ok());
    }

    #[test]
    fn test_solver_validation() {
        assert!(validate_permutation_config(&PermutationConfig {
            iterations: 0,
            seed: None
        })
        .is_err());

        let mut regression = RegressionConfig::default();
        regression.tolerance = 0.0;
        assert!(validate_regression_config(&regression).is_err());

        let mut regression = RegressionConfig::default();
        regression.max_iterations = 0;
        assert!(validate_regression_config(&regression).is_err());
    }

    #[test]
    fn test_logging_validation() {
        let logging = LoggingConfig {
            level: "  ".to_string(),
        };
        assert!(validate_logging_config(&logging).is_err());
        assert!(validate_logging_config(&LoggingConfig::default()).is_ok());
    }
}
