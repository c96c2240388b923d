//! Rank correlation
//!
//! Spearman's rho is the Pearson correlation of average ranks. Its p-value
//! uses the t approximation with `n - 2` degrees of freedom, two-sided.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::core::error::{Error, Result};
use crate::dataframe::SurveyFrame;

/// Ranks starting at 1, ties receive the average of the ranks they span
pub fn rank_average(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut indexed: Vec<(usize, f64)> = data.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        let avg_rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }

        i = j;
    }

    ranks
}

/// Pearson correlation; NaN when either input has zero variance
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch(
            "Variables must have same length".into(),
        ));
    }
    if x.len() < 2 {
        return Err(Error::InsufficientData(
            "At least 2 observations required".into(),
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    let denominator = (sum_xx * sum_yy).sqrt();
    if denominator == 0.0 {
        Ok(f64::NAN)
    } else {
        Ok((sum_xy / denominator).clamp(-1.0, 1.0))
    }
}

/// Spearman rank correlation coefficient
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return Err(Error::InvalidValue(
            "Spearman correlation is undefined for missing values".into(),
        ));
    }
    pearson(&rank_average(x), &rank_average(y))
}

/// Two-sided p-value for a correlation of `rho` over `n` observations
pub fn correlation_p_value(rho: f64, n: usize) -> Result<f64> {
    if n < 3 {
        return Err(Error::InsufficientData(
            "At least 3 observations are needed for a p-value".into(),
        ));
    }
    if rho.is_nan() {
        return Ok(f64::NAN);
    }
    if rho.abs() >= 1.0 {
        return Ok(0.0);
    }

    let dof = (n - 2) as f64;
    let t = rho * (dof / ((1.0 + rho) * (1.0 - rho))).sqrt();
    let dist = StudentsT::new(0.0, 1.0, dof)
        .map_err(|e| Error::Computation(format!("Student t distribution: {}", e)))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Spearman rho with its p-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpearmanResult {
    pub rho: f64,
    pub p_value: f64,
}

pub fn spearman_test(x: &[f64], y: &[f64]) -> Result<SpearmanResult> {
    let rho = spearman(x, y)?;
    Ok(SpearmanResult {
        rho,
        p_value: correlation_p_value(rho, x.len())?,
    })
}

/// Pairwise rank correlations of every column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub rho: Vec<Vec<f64>>,
    pub p_values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.rho[i][j])
    }

    /// Aligned text table of one of the matrices
    pub fn format_table(&self, values: &[Vec<f64>]) -> String {
        let width = self
            .columns
            .iter()
            .map(|c| c.len())
            .max()
            .unwrap_or(0)
            .max(12);

        let mut out = format!("{:width$}", "", width = width);
        for name in &self.columns {
            out.push_str(&format!(" {:>width$}", name, width = width));
        }
        for (name, row) in self.columns.iter().zip(values) {
            out.push('\n');
            out.push_str(&format!("{:width$}", name, width = width));
            for v in row {
                out.push_str(&format!(" {:>width$.6}", v, width = width));
            }
        }
        out
    }
}

/// Spearman correlation and p-value matrices across all columns of `df`
pub fn spearman_matrix(df: &SurveyFrame) -> Result<CorrelationMatrix> {
    let columns: Vec<String> = df.column_names().to_vec();
    if columns.is_empty() {
        return Err(Error::Empty("Frame has no columns".into()));
    }

    let ranked: Vec<Vec<f64>> = df
        .to_matrix()?
        .iter()
        .map(|values| {
            if values.iter().any(|v| v.is_nan()) {
                Err(Error::InvalidValue(
                    "Spearman correlation is undefined for missing values".into(),
                ))
            } else {
                Ok(rank_average(values))
            }
        })
        .collect::<Result<_>>()?;

    let k = columns.len();
    let n = df.row_count();
    let mut rho = vec![vec![1.0; k]; k];
    let mut p_values = vec![vec![0.0; k]; k];

    for i in 0..k {
        for j in (i + 1)..k {
            let r = pearson(&ranked[i], &ranked[j])?;
            let p = correlation_p_value(r, n)?;
            rho[i][j] = r;
            rho[j][i] = r;
            p_values[i][j] = p;
            p_values[j][i] = p;
        }
    }

    Ok(CorrelationMatrix {
        columns,
        rho,
        p_values,
    })
}
