//! Exploratory statistical analysis of a General Social Survey extract
//!
//! The library loads the survey's whitespace-delimited data file into a
//! [`SurveyFrame`], removes non-response codes, recodes the scale items as
//! ordered categoricals and then runs descriptive, distributional,
//! correlation and regression analyses. [`pipeline::run`] chains every
//! stage; each stage is also usable on its own.

pub mod cli;
pub mod config;
pub mod core;
pub mod dataframe;
pub mod io;
pub mod pipeline;
pub mod series;
pub mod stats;
pub mod survey;
pub mod vis;

#[doc(hidden)]
pub mod utils;

pub use crate::config::AnalysisConfig;
pub use crate::core::error::{Error, Result};
pub use crate::dataframe::{ColumnData, SurveyFrame};
pub use crate::pipeline::{run, AnalysisReport};
pub use crate::series::{Categorical, CategoricalOrder};
