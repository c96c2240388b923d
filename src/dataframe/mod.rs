//! Column-oriented survey table
//!
//! `SurveyFrame` keeps named columns of equal length in a fixed order. The
//! loader builds it once; filtering and recoding mutate it in place and every
//! later stage only reads from it.

use std::collections::HashMap;
use std::fmt;

use crate::core::error::{Error, Result};
use crate::series::{Categorical, CategoricalOrder};
use crate::survey::VariableSpec;

/// Storage for one column
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Plain numeric values
    Numeric(Vec<f64>),
    /// Ordered or unordered categorical scale
    Categorical(Categorical<i64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(cat) => cat.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnData::Categorical(_))
    }

    /// Values as floats; categorical entries yield their category value
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ColumnData::Numeric(values) => values.clone(),
            ColumnData::Categorical(cat) => cat.values_f64(),
        }
    }

    fn value_at(&self, row: usize) -> Option<f64> {
        match self {
            ColumnData::Numeric(values) => values.get(row).copied(),
            ColumnData::Categorical(cat) => cat.get(row).map(|&v| v as f64),
        }
    }

    fn filter(&self, mask: &[bool]) -> Result<Self> {
        match self {
            ColumnData::Numeric(values) => Ok(ColumnData::Numeric(
                values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(&v, _)| v)
                    .collect(),
            )),
            ColumnData::Categorical(cat) => Ok(ColumnData::Categorical(cat.filter(mask)?)),
        }
    }
}

/// The survey table
#[derive(Debug, Clone, Default)]
pub struct SurveyFrame {
    columns: HashMap<String, ColumnData>,
    column_order: Vec<String>,
    row_count: usize,
    /// Position of each row in the source file, kept through filtering
    index: Vec<usize>,
}

impl SurveyFrame {
    /// Create a new empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; its length must match the existing columns
    pub fn add_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        let len = data.len();
        if !self.columns.is_empty() && len != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: len,
            });
        }

        if self.columns.is_empty() {
            self.row_count = len;
            self.index = (0..len).collect();
        }
        self.columns.insert(name.clone(), data);
        self.column_order.push(name);
        Ok(())
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_order
    }

    pub fn column_count(&self) -> usize {
        self.column_order.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Numeric view of a column (category values for scale items)
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.column(name)?.to_f64())
    }

    /// Categorical view of a column
    pub fn categorical(&self, name: &str) -> Result<&Categorical<i64>> {
        match self.column(name)? {
            ColumnData::Categorical(cat) => Ok(cat),
            ColumnData::Numeric(_) => Err(Error::InvalidOperation(format!(
                "Column '{}' is not categorical",
                name
            ))),
        }
    }

    /// Keep only rows where `mask` is true
    pub fn filter_rows(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: mask.len(),
            });
        }

        for data in self.columns.values_mut() {
            *data = data.filter(mask)?;
        }
        self.index = self
            .index
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(&i, _)| i)
            .collect();
        self.row_count = mask.iter().filter(|&&keep| keep).count();
        Ok(())
    }

    /// Return a new frame holding only the rows where `mask` is true
    pub fn select_rows(&self, mask: &[bool]) -> Result<SurveyFrame> {
        let mut selected = self.clone();
        selected.filter_rows(mask)?;
        Ok(selected)
    }

    /// Drop every row in which any listed column holds one of its
    /// non-response codes. Returns the number of rows removed.
    pub fn drop_sentinels(&mut self, specs: &[VariableSpec]) -> Result<usize> {
        let mut mask = vec![true; self.row_count];

        for spec in specs {
            let values = self.numeric_values(&spec.name)?;
            for (keep, value) in mask.iter_mut().zip(values) {
                if spec.is_sentinel(value) {
                    *keep = false;
                }
            }
        }

        let before = self.row_count;
        self.filter_rows(&mask)?;
        let removed = before - self.row_count;
        log::info!(
            "Dropped {} of {} rows holding non-response codes",
            removed,
            before
        );
        Ok(removed)
    }

    /// Drop rows with a missing value in any column. Returns the number of
    /// rows removed.
    pub fn drop_missing(&mut self) -> Result<usize> {
        let mut mask = vec![true; self.row_count];
        for name in &self.column_order {
            let data = &self.columns[name];
            for (row, keep) in mask.iter_mut().enumerate() {
                if data.value_at(row).map_or(true, f64::is_nan) {
                    *keep = false;
                }
            }
        }

        let before = self.row_count;
        self.filter_rows(&mask)?;
        let removed = before - self.row_count;
        if removed > 0 {
            log::warn!("Dropped {} rows with missing values", removed);
        }
        Ok(removed)
    }

    /// Recast a numeric column as an ordered categorical scale
    pub fn recode_ordered(&mut self, name: &str, categories: &[i64]) -> Result<()> {
        let data = self
            .columns
            .get_mut(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;

        let values = match data {
            ColumnData::Numeric(values) => values,
            ColumnData::Categorical(_) => {
                return Err(Error::InvalidOperation(format!(
                    "Column '{}' is already categorical",
                    name
                )))
            }
        };

        let codes: Vec<i64> = values.iter().map(|&v| v as i64).collect();
        let cat = Categorical::new(
            codes,
            Some(categories.to_vec()),
            Some(CategoricalOrder::Ordered),
        )?;
        if cat.missing_count() > 0 {
            log::warn!(
                "{} values of '{}' are outside its categories and became missing",
                cat.missing_count(),
                name
            );
        }

        *data = ColumnData::Categorical(cat);
        Ok(())
    }

    /// Recode every categorical column described by `specs`
    pub fn recode_from_specs(&mut self, specs: &[VariableSpec]) -> Result<()> {
        for spec in specs {
            if let Some(categories) = &spec.categories {
                self.recode_ordered(&spec.name, categories)?;
            }
        }
        Ok(())
    }

    /// All columns as float vectors, in column order
    pub fn to_matrix(&self) -> Result<Vec<Vec<f64>>> {
        self.column_order
            .iter()
            .map(|name| self.numeric_values(name))
            .collect()
    }

    /// Source-file row of every remaining row
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Render the last `n` values of one column, pandas `tail` style
    ///
    /// Rows are labelled with their source-file index.
    pub fn tail(&self, name: &str, n: usize) -> Result<String> {
        let data = self.column(name)?;
        let start = self.row_count.saturating_sub(n);
        let mut out = String::new();
        for row in start..self.row_count {
            let label = self.index[row];
            match data.value_at(row) {
                Some(v) => out.push_str(&format!("{:<8}{}\n", label, format_value(v))),
                None => out.push_str(&format!("{:<8}NaN\n", label)),
            }
        }
        out.push_str(&format!("Name: {}, Length: {}", name, self.row_count));
        Ok(out)
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.4}", v)
    }
}

impl fmt::Display for SurveyFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "SurveyFrame: {} rows x {} columns",
            self.row_count,
            self.column_order.len()
        )?;
        for name in &self.column_order {
            let kind = if self.columns[name].is_categorical() {
                "ordered category"
            } else {
                "float64"
            };
            writeln!(f, "  {:<24}{}", name, kind)?;
        }
        Ok(())
    }
}
