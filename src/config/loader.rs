//! Configuration loading utilities
//!
//! This module handles loading configuration from various sources with proper
//! precedence and validation.

use super::*;
use crate::core::error::{Error, Result};
use std::env;
use std::fs;
use std::path::Path;

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::ConfigurationError(format!("Invalid {}: {}", name, e)))
}

/// Apply `SURVEYRS_*` environment variables on top of `config`
pub fn apply_env_overrides(config: &mut AnalysisConfig) -> Result<()> {
    if let Ok(path) = env::var("SURVEYRS_DATA") {
        config.data_path = path.into();
    }

    if let Ok(dir) = env::var("SURVEYRS_OUTPUT_DIR") {
        config.output_dir = dir.into();
    }

    if let Ok(seed) = env::var("SURVEYRS_SEED") {
        config.permutation.seed = Some(parse_env("SURVEYRS_SEED", &seed)?);
    }

    if let Ok(iterations) = env::var("SURVEYRS_PERMUTATIONS") {
        config.permutation.iterations = parse_env("SURVEYRS_PERMUTATIONS", &iterations)?;
    }

    if let Ok(log_level) = env::var("SURVEYRS_LOG_LEVEL").or_else(|_| env::var("RUST_LOG")) {
        config.logging.level = log_level;
    }

    Ok(())
}

/// Load configuration from environment variables
pub fn load_from_env() -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file (YAML or TOML based on extension)
pub fn load_from_file(path: &Path) -> Result<AnalysisConfig> {
    if !path.exists() {
        return Err(Error::ConfigurationError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        Error::ConfigurationError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(&contents),
        Some("toml") => load_from_toml(&contents),
        Some(ext) => Err(Error::ConfigurationError(format!(
            "Unsupported config file format: {}",
            ext
        ))),
        None => load_from_yaml(&contents).or_else(|_| load_from_toml(&contents)),
    }
}

/// Load configuration from YAML string
pub fn load_from_yaml(yaml: &str) -> Result<AnalysisConfig> {
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigurationError(format!("Failed to parse YAML config: {}", e)))
}

/// Load configuration from TOML string
pub fn load_from_toml(toml: &str) -> Result<AnalysisConfig> {
    toml::from_str(toml)
        .map_err(|e| Error::ConfigurationError(format!("Failed to parse TOML config: {}", e)))
}

/// Load configuration with precedence: defaults -> file -> environment
pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::default();

    if let Some(file_path) = config_file {
        let file_config = load_from_file(file_path.as_ref())?;
        config.merge(&file_config);
        log::debug!("Loaded configuration from {}", file_path.as_ref().display());
    }

    apply_env_overrides(&mut config)?;
    config.validate()?;

    Ok(config)
}

/// Save configuration to a file
pub fn save_to_file(config: &AnalysisConfig, path: &Path) -> Result<()> {
    let contents = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => config.to_yaml()?,
        Some("toml") => config.to_toml()?,
        Some(ext) => {
            return Err(Error::ConfigurationError(format!(
                "Unsupported config file format: {}",
                ext
            )))
        }
        None => config.to_yaml()?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    fs::write(path, contents).map_err(|e| {
        Error::ConfigurationError(format!(
            "Failed to write config file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Candidate configuration files in order of precedence
pub fn get_config_file_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![
        "surveyrs.yml".into(),
        "surveyrs.yaml".into(),
        "surveyrs.toml".into(),
    ];

    if let Ok(config_path) = env::var("SURVEYRS_CONFIG_FILE") {
        paths.insert(0, config_path.into());
    }

    paths
}

/// Auto-discover and load configuration file
pub fn auto_load() -> Result<AnalysisConfig> {
    for path in get_config_file_paths() {
        if path.exists() {
            return load_with_precedence(Some(path));
        }
    }

    load_with_precedence::<&Path>(None)
}
