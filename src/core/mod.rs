// Core types shared by every stage of the analysis
pub mod error;

pub use error::{Error, Result};
