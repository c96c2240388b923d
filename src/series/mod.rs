//! Column value containers
//!
//! Survey scale items are held as ordered categorical series; numeric items
//! stay as plain `f64` vectors inside the frame.

pub mod categorical;

pub use categorical::{Categorical, CategoricalOrder};
