//! Small dense matrix helpers for the regression solvers

use crate::core::error::{Error, Result};

/// X' W X for a row-major design matrix and per-row weights
pub fn weighted_gram(x: &[Vec<f64>], weights: &[f64]) -> Vec<Vec<f64>> {
    let p = x.first().map_or(0, |row| row.len());
    let mut result = vec![vec![0.0; p]; p];

    for (row, &w) in x.iter().zip(weights) {
        for i in 0..p {
            let wi = w * row[i];
            for j in i..p {
                result[i][j] += wi * row[j];
            }
        }
    }

    for i in 0..p {
        for j in 0..i {
            result[i][j] = result[j][i];
        }
    }

    result
}

/// X' v for a row-major design matrix
pub fn transpose_times(x: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    let p = x.first().map_or(0, |row| row.len());
    let mut result = vec![0.0; p];
    for (row, &vi) in x.iter().zip(v) {
        for (acc, &xij) in result.iter_mut().zip(row) {
            *acc += xij * vi;
        }
    }
    result
}

/// Matrix times vector
pub fn mat_vec(a: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
        .collect()
}

/// Inverse by Gauss-Jordan elimination with partial pivoting
pub fn matrix_inverse(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();

    if n == 0 {
        return Err(Error::InvalidOperation("Matrix is empty".into()));
    }

    if matrix.iter().any(|row| row.len() != n) {
        return Err(Error::DimensionMismatch("Matrix must be square".into()));
    }

    // Augmented matrix [A|I]
    let mut augmented: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut aug = row.clone();
            aug.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            aug
        })
        .collect();

    // Pivot threshold relative to the largest diagonal entry
    let scale = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| row[i].abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    for i in 0..n {
        let (max_row, max_val) = (i..n)
            .map(|r| (r, augmented[r][i].abs()))
            .fold((i, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if !max_val.is_finite() || max_val < 1e-12 * scale {
            return Err(Error::Computation(
                "Matrix is singular (inverse does not exist)".into(),
            ));
        }

        if max_row != i {
            augmented.swap(i, max_row);
        }

        let pivot = augmented[i][i];
        for value in augmented[i].iter_mut() {
            *value /= pivot;
        }

        let pivot_row = augmented[i].clone();
        for (j, row) in augmented.iter_mut().enumerate() {
            if j != i {
                let factor = row[i];
                if factor != 0.0 {
                    for (value, p) in row.iter_mut().zip(&pivot_row) {
                        *value -= factor * p;
                    }
                }
            }
        }
    }

    Ok(augmented.into_iter().map(|row| row[n..].to_vec()).collect())
}
