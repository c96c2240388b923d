//! End-to-end analysis run
//!
//! [`run`] executes every stage in order: load, filter, recode, describe,
//! compare age PMFs, plot the conservatism CDF, fit age distributions, draw
//! scatterplots, correlate, permute and regress. Each stage is also exposed
//! on its own so it can be exercised against an in-memory frame.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::{AnalysisConfig, PlotsConfig};
use crate::core::error::{Error, Result};
use crate::dataframe::SurveyFrame;
use crate::io::{read_dat, write_csv, write_matrix_csv};
use crate::stats::correlation::{spearman_matrix, CorrelationMatrix};
use crate::stats::descriptive::{
    category_histogram, describe_frame, empirical_cdf, pmf_histogram, ColumnSummary, Histogram,
};
use crate::stats::distributions::{fit_alpha, fit_gamma, fit_rice, linspace, FittedDistribution};
use crate::stats::hypothesis::{correlation_permutation_test, PermutationResult};
use crate::stats::regression::{poisson_with_options, PoissonResults};
use crate::survey::{
    gss_schema, VariableSpec, HOW_CONSERVATIVE, REGRESSION_PREDICTORS, RESP_AGE,
    SHOULD_FUND_EDUCATION, TOTAL_FAMILY_INCOME,
};
use crate::utils::rng_from_seed;
use crate::vis::{self, Chart, ChartSeries, PlotSettings};

/// Highest conservatism score counted as "more liberal"
pub const LIBERAL_MAX: i64 = 3;
/// Lowest conservatism score counted as "more conservative"
pub const CONSERVATIVE_MIN: i64 = 5;

/// Rows kept by each stage of data preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub loaded: usize,
    pub dropped_sentinels: usize,
    pub dropped_missing: usize,
    pub analyzed: usize,
}

/// Size of each group in the age PMF comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSizes {
    pub liberal: usize,
    pub conservative: usize,
}

/// Everything a run computed, plus the files it wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub data_path: PathBuf,
    pub rows: RowCounts,
    pub summaries: Vec<ColumnSummary>,
    pub pmf_groups: GroupSizes,
    pub fits: Vec<FittedDistribution>,
    pub correlation: CorrelationMatrix,
    pub permutation: PermutationResult,
    pub regressions: Vec<PoissonResults>,
    /// Files written, in creation order
    pub outputs: Vec<PathBuf>,
    /// Charts that could not be rendered in this build
    pub skipped_charts: Vec<String>,
}

/// Writes charts into the output directory and keeps track of the results
struct ChartWriter<'a> {
    output_dir: &'a Path,
    preview: bool,
    outputs: Vec<PathBuf>,
    skipped: Vec<String>,
}

impl<'a> ChartWriter<'a> {
    fn new(output_dir: &'a Path, preview: bool) -> Self {
        ChartWriter {
            output_dir,
            preview,
            outputs: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn emit(&mut self, file_name: &str, chart: &Chart) -> Result<()> {
        let path = self.output_dir.join(file_name);
        match vis::save_png(chart, &path) {
            Ok(()) => self.outputs.push(path),
            Err(Error::FeatureNotAvailable(msg)) => {
                log::warn!("Skipping {}: {}", file_name, msg);
                self.skipped.push(file_name.to_string());
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        if self.preview {
            vis::preview(chart)?;
        }
        Ok(())
    }
}

fn plot_settings(plots: &PlotsConfig, title: impl Into<String>) -> PlotSettings {
    PlotSettings::new(title)
        .size(plots.width, plots.height)
        .palette(plots.palette.clone())
}

/// Load the data file, drop non-response rows and recode the scale items
pub fn load_survey(path: &Path, specs: &[VariableSpec]) -> Result<(SurveyFrame, RowCounts)> {
    let df = read_dat(path, specs)?;
    prepare_frame(df, specs)
}

/// Filter and recode a freshly loaded frame
pub fn prepare_frame(
    mut df: SurveyFrame,
    specs: &[VariableSpec],
) -> Result<(SurveyFrame, RowCounts)> {
    let loaded = df.row_count();
    let dropped_sentinels = df.drop_sentinels(specs)?;
    df.recode_from_specs(specs)?;
    let dropped_missing = df.drop_missing()?;

    if df.row_count() == 0 {
        return Err(Error::InsufficientData(
            "No complete responses remain after filtering".into(),
        ));
    }

    let rows = RowCounts {
        loaded,
        dropped_sentinels,
        dropped_missing,
        analyzed: df.row_count(),
    };
    log::info!(
        "Prepared {} of {} rows for analysis",
        rows.analyzed,
        rows.loaded
    );
    Ok((df, rows))
}

/// Histogram of respondent age
pub fn age_histogram_chart(df: &SurveyFrame, plots: &PlotsConfig) -> Result<Chart> {
    let ages = df.numeric_values(RESP_AGE)?;
    let hist = Histogram::equal_width(&ages, plots.age_bins)?;
    Ok(Chart::new(
        plot_settings(plots, format!("Histogram of Variable: {}", RESP_AGE))
            .labels(RESP_AGE, "Frequency"),
    )
    .with_series(ChartSeries::histogram_counts(RESP_AGE, &hist)))
}

/// Bar chart of a categorical column's counts over padded unit bins
pub fn category_chart(df: &SurveyFrame, name: &str, plots: &PlotsConfig) -> Result<Chart> {
    let hist = category_histogram(df.categorical(name)?)?;
    let bars = hist
        .left_edges()
        .iter()
        .zip(&hist.counts)
        .map(|(&x, &count)| (x - 0.4, x + 0.4, count as f64))
        .collect();

    Ok(Chart::new(
        plot_settings(plots, format!("Histogram of Variable: {}", name)).labels(name, "Frequency"),
    )
    .with_series(ChartSeries::Bars {
        label: name.to_string(),
        bars,
    }))
}

/// Age PMFs of the more liberal and more conservative respondents
pub fn age_pmf_chart(df: &SurveyFrame, plots: &PlotsConfig) -> Result<(Chart, GroupSizes)> {
    let conservatism = df.categorical(HOW_CONSERVATIVE)?;
    let liberal = df.select_rows(&conservatism.le(&LIBERAL_MAX)?)?;
    let conservative = df.select_rows(&conservatism.ge(&CONSERVATIVE_MIN)?)?;

    let sizes = GroupSizes {
        liberal: liberal.row_count(),
        conservative: conservative.row_count(),
    };
    log::info!(
        "Age PMF groups: {} more liberal, {} more conservative",
        sizes.liberal,
        sizes.conservative
    );

    let liberal_pmf = pmf_histogram(&liberal.numeric_values(RESP_AGE)?)?;
    let conservative_pmf = pmf_histogram(&conservative.numeric_values(RESP_AGE)?)?;

    let chart = Chart::new(
        plot_settings(plots, "PMFs for Age of Respondents")
            .labels("Age", "Probability")
            .legend(true),
    )
    .with_series(ChartSeries::density_steps("More Liberal", &liberal_pmf))
    .with_series(ChartSeries::density_steps(
        "More Conservative",
        &conservative_pmf,
    ));

    Ok((chart, sizes))
}

/// Empirical CDF of the conservatism scale
pub fn conservatism_cdf_chart(df: &SurveyFrame, plots: &PlotsConfig) -> Result<Chart> {
    let points = empirical_cdf(&df.numeric_values(HOW_CONSERVATIVE)?)?;
    Ok(Chart::new(
        plot_settings(plots, format!("CDF of variable \"{}\"", HOW_CONSERVATIVE))
            .labels(
                "how conservative respondents identified as",
                "Cumulative Probability",
            ),
    )
    .with_series(ChartSeries::Line {
        label: "CDF".into(),
        points,
    }))
}

/// Gamma, Alpha and Rice fits to respondent age
pub fn fit_age_distributions(df: &SurveyFrame) -> Result<Vec<FittedDistribution>> {
    let ages = df.numeric_values(RESP_AGE)?;
    Ok(vec![fit_gamma(&ages)?, fit_alpha(&ages)?, fit_rice(&ages)?])
}

/// Sample density histogram with the fitted densities overlaid
pub fn fit_comparison_chart(
    df: &SurveyFrame,
    fits: &[FittedDistribution],
    plots: &PlotsConfig,
) -> Result<Chart> {
    let ages = df.numeric_values(RESP_AGE)?;
    let hist = Histogram::equal_width(&ages, plots.age_bins)?;
    let xs = linspace(plots.fit_range.0, plots.fit_range.1, plots.fit_points);

    let mut chart = Chart::new(
        plot_settings(plots, "Comparison of Analytic Distributions to Sample Data")
            .labels("Age", "Probability")
            .legend(true),
    )
    .with_series(ChartSeries::histogram_density("Sample", &hist));

    for fit in fits {
        chart = chart.with_series(ChartSeries::Line {
            label: fit.family.to_string(),
            points: fit.pdf_curve(&xs)?,
        });
    }
    Ok(chart)
}

/// Scatterplot of two columns with translucent markers
pub fn scatter_chart(
    df: &SurveyFrame,
    x: &str,
    y: &str,
    settings: PlotSettings,
    plots: &PlotsConfig,
) -> Result<Chart> {
    let xs = df.numeric_values(x)?;
    let ys = df.numeric_values(y)?;
    Ok(Chart::new(settings).with_series(ChartSeries::Points {
        label: format!("{} vs {}", x, y),
        points: xs.into_iter().zip(ys).collect(),
        radius: plots.scatter_radius,
        alpha: plots.scatter_alpha,
    }))
}

/// Regression formulas in fitting order: each predictor alone, then all
pub fn regression_formulas() -> Vec<String> {
    let mut formulas: Vec<String> = REGRESSION_PREDICTORS
        .iter()
        .map(|p| format!("{} ~ {}", HOW_CONSERVATIVE, p))
        .collect();
    formulas.push(format!(
        "{} ~ {}",
        HOW_CONSERVATIVE,
        REGRESSION_PREDICTORS.join(" + ")
    ));
    formulas
}

/// Run the whole analysis described by `config`
pub fn run(config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;

    let plots = &config.plots;
    let specs = gss_schema();
    let mut charts = ChartWriter::new(&config.output_dir, plots.terminal_preview);

    // Load, filter, recode
    log::info!("Loading {}", config.data_path.display());
    let (df, rows) = load_survey(&config.data_path, &specs)?;
    println!("{}", df);

    let cleaned_path = config.output_path("cleaned.csv");
    write_csv(&df, &cleaned_path)?;
    charts.outputs.push(cleaned_path);

    // Histograms
    for name in df.column_names() {
        if name == RESP_AGE {
            charts.emit(&format!("{}.png", name), &age_histogram_chart(&df, plots)?)?;
        } else {
            charts.emit(&format!("{}.png", name), &category_chart(&df, name, plots)?)?;
        }
    }

    // Summaries
    let summaries = describe_frame(&df)?;
    for summary in &summaries {
        println!("{}", summary);
        println!("{}\n", df.tail(summary.name(), 5)?);
    }

    // Group comparison and CDF
    let (pmf_chart, pmf_groups) = age_pmf_chart(&df, plots)?;
    charts.emit("age_pmf.png", &pmf_chart)?;
    charts.emit("conservatism_cdf.png", &conservatism_cdf_chart(&df, plots)?)?;

    // Distribution fitting
    let fits = fit_age_distributions(&df)?;
    for fit in &fits {
        println!("{}", fit);
    }
    charts.emit("age_fits.png", &fit_comparison_chart(&df, &fits, plots)?)?;

    // Scatterplots
    let conservatism_vs_age = plot_settings(plots, "Conservativeness vs. Respondent Age")
        .labels("How Conservative", "Respondent Age")
        .x_range(0.0, 8.0)
        .y_range(13.0, 93.0);
    charts.emit(
        "conservatism_vs_age.png",
        &scatter_chart(&df, HOW_CONSERVATIVE, RESP_AGE, conservatism_vs_age, plots)?,
    )?;
    let income_vs_age = plot_settings(plots, "Family Income vs. Respondent Age")
        .labels("Total Family Income", "Respondent Age");
    charts.emit(
        "income_vs_age.png",
        &scatter_chart(&df, TOTAL_FAMILY_INCOME, RESP_AGE, income_vs_age, plots)?,
    )?;

    // Correlation
    let correlation = spearman_matrix(&df)?;
    println!("Spearman correlation matrix:");
    println!("{}\n", correlation.format_table(&correlation.rho));
    println!("Spearman p-value matrix:");
    println!("{}\n", correlation.format_table(&correlation.p_values));

    let rho_path = config.output_path("spearman_rho.csv");
    write_matrix_csv(&correlation.columns, &correlation.rho, &rho_path)?;
    charts.outputs.push(rho_path);
    let p_path = config.output_path("spearman_p.csv");
    write_matrix_csv(&correlation.columns, &correlation.p_values, &p_path)?;
    charts.outputs.push(p_path);

    // Permutation test
    let mut rng = rng_from_seed(config.permutation.seed);
    let permutation = correlation_permutation_test(
        &df.numeric_values(HOW_CONSERVATIVE)?,
        &df.numeric_values(SHOULD_FUND_EDUCATION)?,
        &mut rng,
        config.permutation.iterations,
    )?;
    println!("{}\n", permutation);

    // Regression
    let options = config.regression.options();
    let mut regressions = Vec::new();
    for formula in regression_formulas() {
        let results = poisson_with_options(&formula, &df, &options)?;
        println!("{}\n", results);
        regressions.push(results);
    }

    let mut report = AnalysisReport {
        data_path: config.data_path.clone(),
        rows,
        summaries,
        pmf_groups,
        fits,
        correlation,
        permutation,
        regressions,
        outputs: charts.outputs,
        skipped_charts: charts.skipped,
    };

    if let Some(path) = &config.report_path {
        report.outputs.push(path.clone());
        write_report(&report, path)?;
    }

    log::info!("Analysis finished, {} files written", report.outputs.len());
    Ok(report)
}

/// Write the report as pretty-printed JSON
pub fn write_report<P: AsRef<Path>>(report: &AnalysisReport, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    log::info!("Wrote report to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::ColumnData;

    fn survey_frame() -> SurveyFrame {
        let n = 40;
        let column = |f: &dyn Fn(usize) -> f64| ColumnData::Numeric((0..n).map(f).collect());

        let mut df = SurveyFrame::new();
        df.add_column("how_fundamentalist", column(&|i| (i % 3 + 1) as f64))
            .unwrap();
        df.add_column("should_fund_education", column(&|i| ((i / 2) % 3 + 1) as f64))
            .unwrap();
        df.add_column("resp_age", column(&|i| 18.0 + ((i * 7) % 60) as f64))
            .unwrap();
        df.add_column("total_family_income", column(&|i| (i % 12 + 1) as f64))
            .unwrap();
        df.add_column("how_conservative", column(&|i| (i % 7 + 1) as f64))
            .unwrap();

        prepare_frame(df, &gss_schema()).unwrap().0
    }

    #[test]
    fn test_prepare_frame_counts() {
        let mut df = SurveyFrame::new();
        df.add_column("how_fundamentalist", ColumnData::Numeric(vec![1.0, 9.0, 2.0]))
            .unwrap();
        df.add_column("should_fund_education", ColumnData::Numeric(vec![1.0, 2.0, 3.0]))
            .unwrap();
        df.add_column("resp_age", ColumnData::Numeric(vec![30.0, 40.0, 50.0]))
            .unwrap();
        df.add_column("total_family_income", ColumnData::Numeric(vec![1.0, 2.0, 3.0]))
            .unwrap();
        df.add_column("how_conservative", ColumnData::Numeric(vec![1.0, 2.0, 3.0]))
            .unwrap();

        let (df, rows) = prepare_frame(df, &gss_schema()).unwrap();
        assert_eq!(
            rows,
            RowCounts {
                loaded: 3,
                dropped_sentinels: 1,
                dropped_missing: 0,
                analyzed: 2
            }
        );
        assert!(df.column("how_conservative").unwrap().is_categorical());
        assert!(!df.column("resp_age").unwrap().is_categorical());
    }

    #[test]
    fn test_category_chart_uses_padded_bins() {
        let df = survey_frame();
        let chart = category_chart(&df, "how_fundamentalist", &PlotsConfig::default()).unwrap();
        assert_eq!(chart.settings.title, "Histogram of Variable: how_fundamentalist");
        match &chart.series[0] {
            ChartSeries::Bars { bars, .. } => {
                // Three categories give edges 0..=5
                assert_eq!(bars.len(), 5);
                assert_eq!(bars[0].2, 0.0);
                let total: f64 = bars.iter().map(|b| b.2).sum();
                assert_eq!(total, 40.0);
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn test_pmf_groups() {
        let df = survey_frame();
        let (chart, sizes) = age_pmf_chart(&df, &PlotsConfig::default()).unwrap();

        let scale: Vec<f64> = df.numeric_values(HOW_CONSERVATIVE).unwrap();
        assert_eq!(sizes.liberal, scale.iter().filter(|&&v| v <= 3.0).count());
        assert_eq!(sizes.conservative, scale.iter().filter(|&&v| v >= 5.0).count());
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].label(), "More Liberal");
        assert!(chart.settings.show_legend);
    }

    #[test]
    fn test_cdf_chart_starts_at_zero() {
        let df = survey_frame();
        let chart = conservatism_cdf_chart(&df, &PlotsConfig::default()).unwrap();
        match &chart.series[0] {
            ChartSeries::Line { points, .. } => {
                assert_eq!(points.len(), 40);
                assert_eq!(points[0], (1.0, 0.0));
                assert!(points.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 < w[1].1));
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn test_regression_formulas() {
        let formulas = regression_formulas();
        assert_eq!(formulas.len(), 5);
        assert_eq!(formulas[0], "how_conservative ~ how_fundamentalist");
        assert_eq!(
            formulas[4],
            "how_conservative ~ how_fundamentalist + resp_age + total_family_income + should_fund_education"
        );
    }

    #[test]
    fn test_scatter_uses_configured_markers() {
        let df = survey_frame();
        let mut plots = PlotsConfig::default();
        plots.scatter_alpha = 0.5;
        let chart = scatter_chart(
            &df,
            HOW_CONSERVATIVE,
            RESP_AGE,
            PlotSettings::new("s").x_range(0.0, 8.0),
            &plots,
        )
        .unwrap();
        match &chart.series[0] {
            ChartSeries::Points { points, alpha, .. } => {
                assert_eq!(points.len(), 40);
                assert_eq!(*alpha, 0.5);
            }
            other => panic!("unexpected series {:?}", other),
        }
    }
}
