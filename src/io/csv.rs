use csv::Writer;
use std::fs::File;
use std::path::Path;

use crate::core::error::{Error, Result};
use crate::dataframe::SurveyFrame;

/// Write the frame to a CSV file with a header row
///
/// Categorical columns are written as their category values; missing
/// entries become empty fields.
pub fn write_csv<P: AsRef<Path>>(df: &SurveyFrame, path: P) -> Result<()> {
    let file = File::create(path.as_ref()).map_err(Error::Io)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(df.column_names()).map_err(Error::Csv)?;

    let columns = df.to_matrix()?;
    for row in 0..df.row_count() {
        let record: Vec<String> = columns
            .iter()
            .map(|values| {
                let v = values[row];
                if v.is_nan() {
                    String::new()
                } else if v.fract() == 0.0 {
                    format!("{}", v as i64)
                } else {
                    v.to_string()
                }
            })
            .collect();
        wtr.write_record(&record).map_err(Error::Csv)?;
    }

    wtr.flush().map_err(Error::Io)?;
    Ok(())
}

/// Write a labelled square matrix (e.g. correlations) to CSV
pub fn write_matrix_csv<P: AsRef<Path>>(
    labels: &[String],
    matrix: &[Vec<f64>],
    path: P,
) -> Result<()> {
    if matrix.len() != labels.len() || matrix.iter().any(|row| row.len() != labels.len()) {
        return Err(Error::DimensionMismatch(format!(
            "Matrix must be {0}x{0} to match its labels",
            labels.len()
        )));
    }

    let file = File::create(path.as_ref()).map_err(Error::Io)?;
    let mut wtr = Writer::from_writer(file);

    let mut header = vec![String::new()];
    header.extend(labels.iter().cloned());
    wtr.write_record(&header).map_err(Error::Csv)?;

    for (label, row) in labels.iter().zip(matrix) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(|v| v.to_string()));
        wtr.write_record(&record).map_err(Error::Csv)?;
    }

    wtr.flush().map_err(Error::Io)?;
    Ok(())
}
