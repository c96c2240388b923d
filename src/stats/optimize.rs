//! Derivative-free minimization
//!
//! Nelder-Mead simplex search, used for maximum likelihood fits where the
//! objective is only piecewise smooth (support boundaries give +inf).

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Stopping rules for [`nelder_mead`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadOptions {
    /// Maximum number of simplex iterations
    pub max_iterations: usize,
    /// Absolute tolerance on simplex vertex spread
    pub xatol: f64,
    /// Absolute tolerance on objective spread
    pub fatol: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        NelderMeadOptions {
            max_iterations: 5000,
            xatol: 1e-6,
            fatol: 1e-8,
        }
    }
}

/// Minimizer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    /// Best point found
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub fun: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether both tolerances were met before the iteration limit
    pub converged: bool,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `x0`
///
/// The initial simplex perturbs each coordinate by 5% (or 0.00025 for a zero
/// coordinate). Non-finite objective values are treated as +inf so the
/// simplex retreats from infeasible regions.
pub fn nelder_mead<F>(f: F, x0: &[f64], options: &NelderMeadOptions) -> Result<OptimizeResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    if n == 0 {
        return Err(Error::InvalidValue("Starting point must not be empty".into()));
    }

    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut vertex = x0.to_vec();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * 1.05
        } else {
            0.00025
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    if values[0].is_infinite() {
        return Err(Error::Computation(
            "Objective is not finite at the starting point".into(),
        ));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        // Sort vertices by objective value
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        let f_spread = values[1..]
            .iter()
            .map(|v| (v - values[0]).abs())
            .fold(0.0_f64, f64::max);
        if x_spread <= options.xatol && f_spread <= options.fatol {
            converged = true;
            break;
        }

        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = simplex[n].clone();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&worst)
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(REFLECTION);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = along(REFLECTION * EXPANSION);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        // Contract towards the better of the reflected and worst points
        let (contracted, f_contracted) = if f_reflected < values[n] {
            let c = along(REFLECTION * CONTRACTION);
            let fc = eval(&c);
            (c, fc)
        } else {
            let c = along(-CONTRACTION);
            let fc = eval(&c);
            (c, fc)
        };

        if f_contracted < values[n].min(f_reflected) {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let best = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = best
                .iter()
                .zip(&simplex[i])
                .map(|(b, x)| b + SHRINK * (x - b))
                .collect();
            values[i] = eval(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    log::debug!(
        "Nelder-Mead finished after {} iterations (converged: {}, f = {})",
        iterations,
        converged,
        values[best]
    );

    Ok(OptimizeResult {
        x: simplex[best].clone(),
        fun: values[best],
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_minimum() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let result = nelder_mead(f, &[0.0, 0.0], &NelderMeadOptions::default()).unwrap();

        assert!(result.converged);
        assert!((result.x[0] - 3.0).abs() < 1e-4);
        assert!((result.x[1] + 1.0).abs() < 1e-4);
        assert!(result.fun < 1e-8);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let result = nelder_mead(f, &[-1.2, 1.0], &NelderMeadOptions::default()).unwrap();

        assert!((result.x[0] - 1.0).abs() < 1e-3);
        assert!((result.x[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_infeasible_region_is_avoided() {
        let f = |x: &[f64]| {
            if x[0] <= 0.0 {
                f64::INFINITY
            } else {
                x[0] - x[0].ln()
            }
        };
        let result = nelder_mead(f, &[4.0], &NelderMeadOptions::default()).unwrap();
        assert!((result.x[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_infinite_start_is_an_error() {
        let f = |_: &[f64]| f64::INFINITY;
        assert!(nelder_mead(f, &[1.0], &NelderMeadOptions::default()).is_err());
        assert!(nelder_mead(f, &[], &NelderMeadOptions::default()).is_err());
    }
}
