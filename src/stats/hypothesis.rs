//! Permutation testing of rank correlation
//!
//! Shuffling one variable breaks any association with the other while
//! keeping both marginal distributions, so the permuted rho shows what
//! correlation looks like by chance.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{Error, Result};
use crate::stats::correlation::spearman;

/// Outcome of a correlation permutation test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationResult {
    /// Spearman rho of the data as observed
    pub observed_rho: f64,
    /// Rho after the first permutation
    pub permuted_rho: f64,
    /// Number of permutations drawn
    pub iterations: usize,
    /// Two-sided empirical p-value, only computed for more than one permutation
    pub p_value: Option<f64>,
}

impl fmt::Display for PermutationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Observed Spearman rho: {:.6}", self.observed_rho)?;
        write!(f, "Permuted Spearman rho: {:.6}", self.permuted_rho)?;
        if let Some(p) = self.p_value {
            write!(
                f,
                "\nPermutation p-value ({} permutations): {:.6}",
                self.iterations, p
            )?;
        }
        Ok(())
    }
}

/// Compare the Spearman correlation of `x` and `y` against shuffled `x`
pub fn correlation_permutation_test<R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    rng: &mut R,
    iterations: usize,
) -> Result<PermutationResult> {
    if iterations == 0 {
        return Err(Error::InvalidValue(
            "At least one permutation is required".into(),
        ));
    }

    let observed_rho = spearman(x, y)?;

    let mut shuffled = x.to_vec();
    let mut permuted_rho = f64::NAN;
    let mut extreme = 0usize;

    for i in 0..iterations {
        shuffled.shuffle(rng);
        let rho = spearman(&shuffled, y)?;
        if i == 0 {
            permuted_rho = rho;
        }
        if rho.abs() >= observed_rho.abs() {
            extreme += 1;
        }
    }

    let p_value = if iterations > 1 {
        Some((1 + extreme) as f64 / (1 + iterations) as f64)
    } else {
        None
    };

    log::info!(
        "Permutation test: observed rho {:.4}, permuted rho {:.4}",
        observed_rho,
        permuted_rho
    );

    Ok(PermutationResult {
        observed_rho,
        permuted_rho,
        iterations,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rng_from_seed;

    fn trend(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| (i as f64) * 2.0 + ((i % 3) as f64)).collect();
        (x, y)
    }

    #[test]
    fn test_single_permutation_has_no_p_value() {
        let (x, y) = trend(50);
        let mut rng = rng_from_seed(Some(7));
        let result = correlation_permutation_test(&x, &y, &mut rng, 1).unwrap();

        assert!(result.observed_rho > 0.99);
        assert!(result.permuted_rho.abs() < result.observed_rho);
        assert_eq!(result.iterations, 1);
        assert!(result.p_value.is_none());
    }

    #[test]
    fn test_strong_association_has_small_p_value() {
        let (x, y) = trend(60);
        let mut rng = rng_from_seed(Some(11));
        let result = correlation_permutation_test(&x, &y, &mut rng, 199).unwrap();

        let p = result.p_value.unwrap();
        assert!((p - 1.0 / 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_seed_reproducibility() {
        let (x, y) = trend(40);
        let a = correlation_permutation_test(&x, &y, &mut rng_from_seed(Some(3)), 5).unwrap();
        let b = correlation_permutation_test(&x, &y, &mut rng_from_seed(Some(3)), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_input_is_not_mutated_and_errors() {
        let (x, y) = trend(10);
        let before = x.clone();
        let mut rng = rng_from_seed(Some(1));
        correlation_permutation_test(&x, &y, &mut rng, 3).unwrap();
        assert_eq!(x, before);

        assert!(correlation_permutation_test(&x, &y, &mut rng, 0).is_err());
        assert!(correlation_permutation_test(&x, &y[..5], &mut rng, 1).is_err());
    }
}
