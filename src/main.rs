use anyhow::{Context, Result};
use clap::Parser;
use surveyrs::cli::Cli;
use surveyrs::config::{loader, AnalysisConfig};

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => loader::auto_load().context("Failed to load configuration")?,
    };
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    env_logger::Builder::new()
        .parse_filters(&config.logging.level)
        .try_init()
        .context("Failed to initialise logging")?;

    let report = surveyrs::pipeline::run(&config).with_context(|| {
        format!("Analysis of {} failed", config.data_path.display())
    })?;

    println!(
        "Analyzed {} of {} rows; wrote {} files to {}",
        report.rows.analyzed,
        report.rows.loaded,
        report.outputs.len(),
        config.output_dir.display()
    );
    if !report.skipped_charts.is_empty() {
        println!(
            "Charts skipped (visualization feature disabled): {}",
            report.skipped_charts.join(", ")
        );
    }

    Ok(())
}
