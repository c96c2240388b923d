//! Regression models specified by formula strings

pub mod formula;
pub mod linalg;
pub mod poisson;

pub use formula::{Design, Formula, INTERCEPT};
pub use poisson::{poisson, poisson_with_options, PoissonOptions, PoissonResults};
