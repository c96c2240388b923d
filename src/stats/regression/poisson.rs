//! Poisson regression with a log link
//!
//! Maximum likelihood by Newton-Raphson on the full Hessian. Inference
//! (standard errors, z tests, confidence intervals) uses the inverse of the
//! observed information at the optimum.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use statrs::function::gamma::ln_gamma;
use std::fmt;

use super::formula::{Design, Formula};
use super::linalg::{mat_vec, matrix_inverse, transpose_times, weighted_gram};
use crate::core::error::{Error, Result};
use crate::dataframe::SurveyFrame;

/// Newton-Raphson stopping rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoissonOptions {
    pub max_iterations: usize,
    /// Largest absolute parameter step accepted as converged
    pub tolerance: f64,
}

impl Default for PoissonOptions {
    fn default() -> Self {
        PoissonOptions {
            max_iterations: 35,
            tolerance: 1e-8,
        }
    }
}

/// Fitted Poisson model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoissonResults {
    pub formula: String,
    pub response: String,
    /// Parameter labels, `Intercept` first
    pub names: Vec<String>,
    pub params: Vec<f64>,
    pub bse: Vec<f64>,
    pub z_values: Vec<f64>,
    pub p_values: Vec<f64>,
    /// 95% confidence intervals
    pub conf_int: Vec<(f64, f64)>,
    pub llf: f64,
    pub llnull: f64,
    pub llr: f64,
    pub llr_pvalue: f64,
    pub pseudo_r_squared: f64,
    pub aic: f64,
    pub bic: f64,
    pub nobs: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub iterations: usize,
    pub converged: bool,
}

impl PoissonResults {
    /// Coefficient for a named parameter
    pub fn param(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.params[i])
    }
}

/// Fit `formula` against `df` with default options
pub fn poisson(formula: &str, df: &SurveyFrame) -> Result<PoissonResults> {
    poisson_with_options(formula, df, &PoissonOptions::default())
}

pub fn poisson_with_options(
    formula: &str,
    df: &SurveyFrame,
    options: &PoissonOptions,
) -> Result<PoissonResults> {
    let formula = Formula::parse(formula)?;
    let design = formula.design(df)?;
    fit_design(&formula, design, options)
}

fn log_likelihood(y: &[f64], eta: &[f64], ln_y_factorial: &[f64]) -> f64 {
    y.iter()
        .zip(eta)
        .zip(ln_y_factorial)
        .map(|((&yi, &e), &lf)| yi * e - e.exp() - lf)
        .sum()
}

fn fit_design(formula: &Formula, design: Design, options: &PoissonOptions) -> Result<PoissonResults> {
    let Design {
        response: y,
        matrix: x,
        names,
    } = design;

    let n = y.len();
    let k = names.len();
    if n <= k {
        return Err(Error::InsufficientData(format!(
            "{} observations cannot identify {} parameters",
            n, k
        )));
    }
    if y.iter().any(|&v| v < 0.0 || v.fract() != 0.0) {
        return Err(Error::InvalidValue(format!(
            "Response '{}' must hold non-negative counts",
            formula.response
        )));
    }

    let mean_y = y.iter().sum::<f64>() / n as f64;
    if mean_y <= 0.0 {
        return Err(Error::InvalidValue(format!(
            "Response '{}' is all zero",
            formula.response
        )));
    }

    let ln_y_factorial: Vec<f64> = y.iter().map(|&v| ln_gamma(v + 1.0)).collect();

    // Intercept-only model has a closed form
    let null_eta = vec![mean_y.ln(); n];
    let llnull = log_likelihood(&y, &null_eta, &ln_y_factorial);

    let mut beta = vec![0.0; k];
    beta[0] = mean_y.ln();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iterations {
        iterations += 1;

        let eta = mat_vec(&x, &beta);
        let mu: Vec<f64> = eta.iter().map(|e| e.exp()).collect();
        if mu.iter().any(|m| !m.is_finite()) {
            return Err(Error::Computation(format!(
                "Poisson fit of '{}' diverged",
                formula
            )));
        }

        let residual: Vec<f64> = y.iter().zip(&mu).map(|(yi, mi)| yi - mi).collect();
        let score = transpose_times(&x, &residual);
        let information = weighted_gram(&x, &mu);
        let step = mat_vec(&matrix_inverse(&information)?, &score);

        for (b, s) in beta.iter_mut().zip(&step) {
            *b += s;
        }

        let largest = step.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
        log::debug!("Newton-Raphson iteration {}: max step {:.3e}", iterations, largest);
        if largest < options.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        log::warn!(
            "Poisson fit of '{}' did not converge in {} iterations",
            formula,
            iterations
        );
    }

    let eta = mat_vec(&x, &beta);
    let mu: Vec<f64> = eta.iter().map(|e| e.exp()).collect();
    let llf = log_likelihood(&y, &eta, &ln_y_factorial);
    let covariance = matrix_inverse(&weighted_gram(&x, &mu))?;

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| Error::Computation(format!("Normal distribution: {}", e)))?;
    let critical = normal.inverse_cdf(0.975);

    let bse: Vec<f64> = (0..k).map(|i| covariance[i][i].max(0.0).sqrt()).collect();
    let z_values: Vec<f64> = beta.iter().zip(&bse).map(|(b, s)| b / s).collect();
    let p_values: Vec<f64> = z_values
        .iter()
        .map(|z| 2.0 * normal.sf(z.abs()))
        .collect();
    let conf_int = beta
        .iter()
        .zip(&bse)
        .map(|(b, s)| (b - critical * s, b + critical * s))
        .collect();

    let df_model = k - 1;
    let llr = 2.0 * (llf - llnull);
    let chi2 = ChiSquared::new(df_model as f64)
        .map_err(|e| Error::Computation(format!("Chi-squared distribution: {}", e)))?;
    let llr_pvalue = chi2.sf(llr.max(0.0));

    let results = PoissonResults {
        formula: formula.to_string(),
        response: formula.response.clone(),
        names,
        params: beta,
        bse,
        z_values,
        p_values,
        conf_int,
        llf,
        llnull,
        llr,
        llr_pvalue,
        pseudo_r_squared: 1.0 - llf / llnull,
        aic: -2.0 * llf + 2.0 * k as f64,
        bic: -2.0 * llf + (n as f64).ln() * k as f64,
        nobs: n,
        df_model,
        df_resid: n - k,
        iterations,
        converged,
    };

    log::info!(
        "Fitted Poisson model '{}' (llf {:.3}, {} iterations)",
        results.formula,
        results.llf,
        results.iterations
    );

    Ok(results)
}

const RULE_WIDTH: usize = 78;

fn header_line(
    f: &mut fmt::Formatter<'_>,
    left: (&str, String),
    right: Option<(&str, String)>,
) -> fmt::Result {
    let left_text = format!("{:<21}{:>18}", left.0, left.1);
    match right {
        Some((label, value)) => writeln!(f, "{} {:<21}{:>17}", left_text, label, value),
        None => writeln!(f, "{}", left_text),
    }
}

impl fmt::Display for PoissonResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{:^width$}", "Poisson Regression Results", width = RULE_WIDTH)?;
        writeln!(f, "{}", heavy)?;
        header_line(
            f,
            ("Dep. Variable:", self.response.clone()),
            Some(("No. Observations:", self.nobs.to_string())),
        )?;
        header_line(
            f,
            ("Model:", "Poisson".into()),
            Some(("Df Residuals:", self.df_resid.to_string())),
        )?;
        header_line(
            f,
            ("Method:", "MLE".into()),
            Some(("Df Model:", self.df_model.to_string())),
        )?;
        header_line(
            f,
            ("Converged:", if self.converged { "True" } else { "False" }.into()),
            Some(("Pseudo R-squ.:", format!("{:.6}", self.pseudo_r_squared))),
        )?;
        header_line(
            f,
            ("No. Iterations:", self.iterations.to_string()),
            Some(("Log-Likelihood:", format!("{:.2}", self.llf))),
        )?;
        header_line(
            f,
            ("AIC:", format!("{:.2}", self.aic)),
            Some(("LL-Null:", format!("{:.2}", self.llnull))),
        )?;
        header_line(
            f,
            ("BIC:", format!("{:.2}", self.bic)),
            Some(("LLR p-value:", format!("{:.4e}", self.llr_pvalue))),
        )?;
        writeln!(f, "{}", heavy)?;

        let label_width = self
            .names
            .iter()
            .map(|n| n.len())
            .max()
            .unwrap_or(0)
            .max(14);
        writeln!(
            f,
            "{:<lw$} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "",
            "coef",
            "std err",
            "z",
            "P>|z|",
            "[0.025",
            "0.975]",
            lw = label_width
        )?;
        writeln!(f, "{}", light)?;
        for i in 0..self.names.len() {
            writeln!(
                f,
                "{:<lw$} {:>10.4} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                self.names[i],
                self.params[i],
                self.bse[i],
                self.z_values[i],
                self.p_values[i],
                self.conf_int[i].0,
                self.conf_int[i].1,
                lw = label_width
            )?;
        }
        write!(f, "{}", heavy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::ColumnData;

    fn frame(columns: &[(&str, Vec<f64>)]) -> SurveyFrame {
        let mut df = SurveyFrame::new();
        for (name, values) in columns {
            df.add_column(*name, ColumnData::Numeric(values.clone()))
                .unwrap();
        }
        df
    }

    #[test]
    fn test_binary_predictor_matches_group_means() {
        // Group 0 mean 2, group 1 mean 5
        let y = vec![1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 6.0, 5.0];
        let g = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let df = frame(&[("y", y), ("g", g)]);

        let result = poisson("y ~ g", &df).unwrap();
        assert!(result.converged);
        assert!((result.params[0] - 2.0_f64.ln()).abs() < 1e-8);
        assert!((result.param("g").unwrap() - (5.0_f64 / 2.0).ln()).abs() < 1e-8);

        // Var(b) for a saturated two-group model is 1 / (n_g * mean_g)
        assert!((result.bse[0] - (1.0_f64 / 8.0).sqrt()).abs() < 1e-6);
        let expected = (1.0 / 8.0 + 1.0 / 20.0_f64).sqrt();
        assert!((result.bse[1] - expected).abs() < 1e-6);

        assert_eq!(result.nobs, 8);
        assert_eq!(result.df_model, 1);
        assert_eq!(result.df_resid, 6);
        assert!(result.llf > result.llnull);
        assert!(result.llr > 0.0);
        assert!(result.llr_pvalue < 0.05);
        assert!(result.pseudo_r_squared > 0.0 && result.pseudo_r_squared < 1.0);

        let (lo, hi) = result.conf_int[1];
        assert!(lo < result.params[1] && result.params[1] < hi);
        assert!((result.aic - (-2.0 * result.llf + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_predictor_has_zero_slope() {
        let y = vec![2.0, 3.0, 2.0, 3.0];
        let x = vec![1.0, 1.0, 2.0, 2.0];
        let df = frame(&[("y", y), ("x", x)]);

        let result = poisson("y ~ x", &df).unwrap();
        assert!(result.params[1].abs() < 1e-8);
        assert!((result.llf - result.llnull).abs() < 1e-8);
        assert!(result.pseudo_r_squared.abs() < 1e-8);
        assert!(result.p_values[1] > 0.99);
    }

    #[test]
    fn test_collinear_predictors_are_singular() {
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let df = frame(&[("y", y), ("a", a), ("b", b)]);

        assert!(matches!(
            poisson("y ~ a + b", &df),
            Err(Error::Computation(_))
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        let df = frame(&[
            ("y", vec![1.0, 2.5, 3.0, 1.0]),
            ("z", vec![0.0, 0.0, 0.0, 0.0]),
            ("x", vec![1.0, 2.0, 3.0, 4.0]),
        ]);
        assert!(matches!(poisson("y ~ x", &df), Err(Error::InvalidValue(_))));
        assert!(matches!(poisson("z ~ x", &df), Err(Error::InvalidValue(_))));
        assert!(matches!(
            poisson("x ~ missing", &df),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(poisson("x ~", &df), Err(Error::Format(_))));
    }

    #[test]
    fn test_summary_layout() {
        let df = frame(&[
            ("count", vec![1.0, 0.0, 2.0, 4.0, 3.0, 6.0]),
            ("dose", vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]),
        ]);
        let result = poisson("count ~ dose", &df).unwrap();
        let summary = result.to_string();

        assert!(summary.contains("Poisson Regression Results"));
        assert!(summary.contains("Dep. Variable:"));
        assert!(summary.contains("count"));
        assert!(summary.contains("Intercept"));
        assert!(summary.contains("dose"));
        assert!(summary.contains("LLR p-value:"));
        assert!(summary.contains("P>|z|"));
    }
}
