//! Reading the raw survey extract and exporting derived tables

pub mod csv;
pub mod dat;

pub use self::csv::{write_csv, write_matrix_csv};
pub use self::dat::{parse_dat, read_dat};
