//! Whitespace-delimited `.dat` reader
//!
//! The survey export has no header row; each line is one respondent and
//! fields are separated by runs of spaces or tabs. Only the positions listed
//! in the schema are kept, named after their `VariableSpec`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::error::{Error, Result};
use crate::dataframe::{ColumnData, SurveyFrame};
use crate::survey::VariableSpec;

/// Read the selected columns of a `.dat` file into a frame
pub fn read_dat<P: AsRef<Path>>(path: P, specs: &[VariableSpec]) -> Result<SurveyFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(Error::Io)?;
    log::info!("Loading survey extract from {}", path.display());
    parse_dat(BufReader::new(file), specs)
}

/// Parse whitespace-delimited rows from any reader
///
/// Columns come out in ascending source position regardless of the order of
/// `specs`. Blank lines are skipped.
pub fn parse_dat<R: BufRead>(reader: R, specs: &[VariableSpec]) -> Result<SurveyFrame> {
    if specs.is_empty() {
        return Err(Error::InvalidValue("No columns selected".into()));
    }

    let mut ordered: Vec<&VariableSpec> = specs.iter().collect();
    ordered.sort_by_key(|spec| spec.position);
    let needed = ordered.last().map(|spec| spec.position + 1).unwrap_or(0);

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); ordered.len()];

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(Error::Io)?;
        let line_no = index + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }

        if fields.len() < needed {
            return Err(Error::Format(format!(
                "Line {} has {} fields but column position {} was requested",
                line_no,
                fields.len(),
                needed - 1
            )));
        }

        for (column, spec) in columns.iter_mut().zip(&ordered) {
            let raw = fields[spec.position];
            let value = raw.parse::<i64>().map_err(|e| Error::Parse {
                line: line_no,
                field: spec.position,
                message: format!("'{}' is not an integer code: {}", raw, e),
            })?;
            column.push(value as f64);
        }
    }

    let mut df = SurveyFrame::new();
    for (spec, values) in ordered.into_iter().zip(columns) {
        df.add_column(spec.name.clone(), ColumnData::Numeric(values))?;
    }

    log::info!(
        "Loaded {} rows x {} columns",
        df.row_count(),
        df.column_count()
    );
    Ok(df)
}
