//! Continuous distributions with location and scale, and their MLE fits
//!
//! Every family is defined through a standard density `f0(z; shape)` and the
//! usual transform `f(x) = f0((x - loc) / scale) / scale`. Fitting maximizes
//! the log-likelihood over (shape, loc, scale) with Nelder-Mead.

use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use statrs::function::gamma::ln_gamma;

use crate::core::error::{Error, Result};
use crate::stats::descriptive::skewness;
use crate::stats::optimize::{nelder_mead, NelderMeadOptions};
use crate::stats::special::{ln_bessel_i0, ln_std_normal_pdf};

/// Trait for continuous probability distributions
pub trait ContinuousDistribution {
    /// Family name
    fn name(&self) -> &'static str;

    /// Log of the probability density function, `-inf` outside the support
    fn ln_pdf(&self, x: f64) -> f64;

    /// Probability density function (PDF)
    fn pdf(&self, x: f64) -> f64 {
        self.ln_pdf(x).exp()
    }

    /// Shape, location and scale
    fn params(&self) -> DistributionParams;

    /// Sum of log densities over a sample
    fn log_likelihood(&self, data: &[f64]) -> f64 {
        data.iter().map(|&x| self.ln_pdf(x)).sum()
    }
}

/// Parameters shared by the loc/scale families
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionParams {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
}

/// Supported families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionFamily {
    Gamma,
    Alpha,
    Rice,
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionFamily::Gamma => "Gamma",
            DistributionFamily::Alpha => "Alpha",
            DistributionFamily::Rice => "Rice",
        };
        f.write_str(name)
    }
}

fn check_scale(scale: f64) -> Result<()> {
    if scale > 0.0 && scale.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidValue("Scale must be positive and finite".into()))
    }
}

/// Gamma distribution with shape `a`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaDist {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
    ln_gamma_shape: f64,
}

impl GammaDist {
    pub fn new(shape: f64, loc: f64, scale: f64) -> Result<Self> {
        if !(shape > 0.0 && shape.is_finite()) {
            return Err(Error::InvalidValue("Gamma shape must be positive".into()));
        }
        check_scale(scale)?;
        Ok(GammaDist {
            shape,
            loc,
            scale,
            ln_gamma_shape: ln_gamma(shape),
        })
    }
}

impl ContinuousDistribution for GammaDist {
    fn name(&self) -> &'static str {
        "Gamma"
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        if z <= 0.0 {
            return f64::NEG_INFINITY;
        }
        (self.shape - 1.0) * z.ln() - z - self.ln_gamma_shape - self.scale.ln()
    }

    fn params(&self) -> DistributionParams {
        DistributionParams {
            shape: self.shape,
            loc: self.loc,
            scale: self.scale,
        }
    }
}

/// Alpha distribution with shape `a`
///
/// If `Y ~ N(a, 1)` is conditioned on being positive, `1 / Y` follows the
/// standard alpha distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaDist {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
    ln_norm_cdf_shape: f64,
}

impl AlphaDist {
    pub fn new(shape: f64, loc: f64, scale: f64) -> Result<Self> {
        if !(shape > 0.0 && shape.is_finite()) {
            return Err(Error::InvalidValue("Alpha shape must be positive".into()));
        }
        check_scale(scale)?;
        let norm_cdf = 0.5 * erfc(-shape / std::f64::consts::SQRT_2);
        Ok(AlphaDist {
            shape,
            loc,
            scale,
            ln_norm_cdf_shape: norm_cdf.ln(),
        })
    }
}

impl ContinuousDistribution for AlphaDist {
    fn name(&self) -> &'static str {
        "Alpha"
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        if z <= 0.0 {
            return f64::NEG_INFINITY;
        }
        ln_std_normal_pdf(self.shape - 1.0 / z)
            - 2.0 * z.ln()
            - self.ln_norm_cdf_shape
            - self.scale.ln()
    }

    fn params(&self) -> DistributionParams {
        DistributionParams {
            shape: self.shape,
            loc: self.loc,
            scale: self.scale,
        }
    }
}

/// Rice distribution with shape `b` (noncentrality over scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiceDist {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
}

impl RiceDist {
    pub fn new(shape: f64, loc: f64, scale: f64) -> Result<Self> {
        if !(shape >= 0.0 && shape.is_finite()) {
            return Err(Error::InvalidValue("Rice shape must be non-negative".into()));
        }
        check_scale(scale)?;
        Ok(RiceDist { shape, loc, scale })
    }
}

impl ContinuousDistribution for RiceDist {
    fn name(&self) -> &'static str {
        "Rice"
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        if z <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let b = self.shape;
        z.ln() - 0.5 * (z * z + b * b) + ln_bessel_i0(z * b) - self.scale.ln()
    }

    fn params(&self) -> DistributionParams {
        DistributionParams {
            shape: self.shape,
            loc: self.loc,
            scale: self.scale,
        }
    }
}

/// Families that can be fitted by maximum likelihood
pub trait MaximumLikelihood: ContinuousDistribution + Sized {
    const FAMILY: DistributionFamily;

    /// Build from `[shape, loc, scale]`
    fn from_params(params: &[f64]) -> Result<Self>;

    /// Feasible starting point for the optimizer
    fn initial_guess(sample: &SampleMoments) -> [f64; 3];
}

impl MaximumLikelihood for GammaDist {
    const FAMILY: DistributionFamily = DistributionFamily::Gamma;

    fn from_params(params: &[f64]) -> Result<Self> {
        GammaDist::new(params[0], params[1], params[2])
    }

    fn initial_guess(sample: &SampleMoments) -> [f64; 3] {
        // Method of moments through the skewness, 2 / sqrt(a)
        let shape = (4.0 / (1e-8 + sample.skewness.powi(2))).clamp(1.0, 400.0);
        let scale = sample.std / shape.sqrt();
        let loc = sample.below_min(sample.mean - shape * scale);
        [shape, loc, scale]
    }
}

impl MaximumLikelihood for AlphaDist {
    const FAMILY: DistributionFamily = DistributionFamily::Alpha;

    fn from_params(params: &[f64]) -> Result<Self> {
        AlphaDist::new(params[0], params[1], params[2])
    }

    fn initial_guess(sample: &SampleMoments) -> [f64; 3] {
        // For moderate a, z is roughly 1/a with spread 1/a^2
        let shape = 3.0;
        let scale = sample.std * shape * shape;
        let loc = sample.below_min(sample.mean - scale / shape);
        [shape, loc, scale]
    }
}

impl MaximumLikelihood for RiceDist {
    const FAMILY: DistributionFamily = DistributionFamily::Rice;

    fn from_params(params: &[f64]) -> Result<Self> {
        RiceDist::new(params[0], params[1], params[2])
    }

    fn initial_guess(sample: &SampleMoments) -> [f64; 3] {
        // Large b makes the Rice close to N(b * scale, scale)
        let shape = 3.0;
        let scale = sample.std;
        let loc = sample.below_min(sample.mean - shape * scale);
        [shape, loc, scale]
    }
}

/// Moments used to seed the optimizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleMoments {
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    pub min: f64,
}

impl SampleMoments {
    pub fn from_data(data: &[f64]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::InsufficientData(
                "At least 2 observations are needed to fit a distribution".into(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidValue(
                "Cannot fit a distribution to non-finite values".into(),
            ));
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let std = (data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        if std == 0.0 {
            return Err(Error::InsufficientData(
                "Sample has zero variance".into(),
            ));
        }

        Ok(SampleMoments {
            mean,
            std,
            skewness: skewness(data),
            min: data.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }

    /// `loc` if it lies strictly below the sample minimum, otherwise a point
    /// a tenth of a standard deviation below it
    fn below_min(&self, loc: f64) -> f64 {
        if loc < self.min {
            loc
        } else {
            self.min - 0.1 * self.std
        }
    }
}

/// Outcome of a maximum likelihood fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedDistribution {
    pub family: DistributionFamily,
    pub params: DistributionParams,
    pub log_likelihood: f64,
    /// Akaike information criterion with three free parameters
    pub aic: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl FittedDistribution {
    /// Recreate the fitted distribution for density evaluation
    pub fn distribution(&self) -> Result<Box<dyn ContinuousDistribution>> {
        let p = self.params;
        Ok(match self.family {
            DistributionFamily::Gamma => Box::new(GammaDist::new(p.shape, p.loc, p.scale)?),
            DistributionFamily::Alpha => Box::new(AlphaDist::new(p.shape, p.loc, p.scale)?),
            DistributionFamily::Rice => Box::new(RiceDist::new(p.shape, p.loc, p.scale)?),
        })
    }

    /// Density evaluated on `xs`
    pub fn pdf_curve(&self, xs: &[f64]) -> Result<Vec<(f64, f64)>> {
        let dist = self.distribution()?;
        Ok(xs.iter().map(|&x| (x, dist.pdf(x))).collect())
    }
}

impl fmt::Display for FittedDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} shape={:.6} loc={:.6} scale={:.6} logL={:.4} AIC={:.4}",
            self.family,
            self.params.shape,
            self.params.loc,
            self.params.scale,
            self.log_likelihood,
            self.aic
        )
    }
}

/// Number of restarts from the previous optimum
const MAX_RESTARTS: usize = 3;

/// Fit family `D` to `data` by maximum likelihood
pub fn fit<D: MaximumLikelihood>(data: &[f64]) -> Result<FittedDistribution> {
    let moments = SampleMoments::from_data(data)?;
    let start = D::initial_guess(&moments);

    let neg_log_likelihood = |params: &[f64]| -> f64 {
        match D::from_params(params) {
            Ok(dist) => {
                let ll = dist.log_likelihood(data);
                if ll.is_finite() {
                    -ll
                } else {
                    f64::INFINITY
                }
            }
            Err(_) => f64::INFINITY,
        }
    };

    let options = NelderMeadOptions::default();
    let mut result = nelder_mead(&neg_log_likelihood, &start, &options)?;
    let mut iterations = result.iterations;

    for _ in 0..MAX_RESTARTS {
        let next = nelder_mead(&neg_log_likelihood, &result.x, &options)?;
        iterations += next.iterations;
        let improved = result.fun - next.fun > 1e-9 * result.fun.abs().max(1.0);
        result = next;
        if !improved {
            break;
        }
    }

    if !result.fun.is_finite() {
        return Err(Error::Computation(format!(
            "{} fit did not reach a finite likelihood",
            D::FAMILY
        )));
    }
    if !result.converged {
        log::warn!(
            "{} fit stopped at the iteration limit; parameters may be imprecise",
            D::FAMILY
        );
    }

    let dist = D::from_params(&result.x)?;
    let log_likelihood = -result.fun;
    let fitted = FittedDistribution {
        family: D::FAMILY,
        params: dist.params(),
        log_likelihood,
        aic: 2.0 * 3.0 - 2.0 * log_likelihood,
        iterations,
        converged: result.converged,
    };
    log::info!("Fitted {}", fitted);
    Ok(fitted)
}

pub fn fit_gamma(data: &[f64]) -> Result<FittedDistribution> {
    fit::<GammaDist>(data)
}

pub fn fit_alpha(data: &[f64]) -> Result<FittedDistribution> {
    fit::<AlphaDist>(data)
}

pub fn fit_rice(data: &[f64]) -> Result<FittedDistribution> {
    fit::<RiceDist>(data)
}

/// `n` evenly spaced points over `[start, end]`
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
