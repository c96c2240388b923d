//! Statistical analysis
//!
//! Descriptive summaries and histograms, maximum likelihood fits of
//! continuous distributions, rank correlation with permutation testing, and
//! Poisson regression.

pub mod correlation;
pub mod descriptive;
pub mod distributions;
pub mod hypothesis;
pub mod optimize;
pub mod regression;
pub mod special;

pub use correlation::{spearman, spearman_matrix, spearman_test, CorrelationMatrix, SpearmanResult};
pub use descriptive::{
    category_histogram, describe, describe_categorical, describe_frame, empirical_cdf,
    pmf_histogram, CategoricalSummary, ColumnSummary, Histogram, NumericSummary,
};
pub use distributions::{
    fit_alpha, fit_gamma, fit_rice, linspace, ContinuousDistribution, DistributionFamily,
    DistributionParams, FittedDistribution,
};
pub use hypothesis::{correlation_permutation_test, PermutationResult};
pub use regression::{poisson, Formula, PoissonOptions, PoissonResults};
