//! Descriptive statistics, histograms and empirical distributions
//!
//! Summaries follow the pandas `describe` layout: numeric columns report
//! count, mean, standard deviation and quartiles; categorical columns report
//! count, number of distinct categories, the most frequent category and its
//! frequency.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::dataframe::{ColumnData, SurveyFrame};
use crate::series::Categorical;

/// Summary of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Sample size
    pub count: usize,
    /// Mean (average)
    pub mean: f64,
    /// Standard deviation (n - 1 denominator)
    pub std: f64,
    /// Minimum value
    pub min: f64,
    /// 25th percentile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// 75th percentile
    pub q3: f64,
    /// Maximum value
    pub max: f64,
}

/// Summary of a categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    /// Non-missing entries
    pub count: usize,
    /// Distinct categories observed
    pub unique: usize,
    /// Most frequent category
    pub top: Option<i64>,
    /// Occurrences of `top`
    pub freq: usize,
}

/// Per-column summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric {
        name: String,
        summary: NumericSummary,
    },
    Categorical {
        name: String,
        summary: CategoricalSummary,
    },
}

impl ColumnSummary {
    pub fn name(&self) -> &str {
        match self {
            ColumnSummary::Numeric { name, .. } | ColumnSummary::Categorical { name, .. } => name,
        }
    }
}

impl fmt::Display for ColumnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSummary::Numeric { name, summary: s } => {
                writeln!(f, "count {:>12.6}", s.count as f64)?;
                writeln!(f, "mean  {:>12.6}", s.mean)?;
                writeln!(f, "std   {:>12.6}", s.std)?;
                writeln!(f, "min   {:>12.6}", s.min)?;
                writeln!(f, "25%   {:>12.6}", s.q1)?;
                writeln!(f, "50%   {:>12.6}", s.median)?;
                writeln!(f, "75%   {:>12.6}", s.q3)?;
                writeln!(f, "max   {:>12.6}", s.max)?;
                write!(f, "Name: {}, dtype: float64", name)
            }
            ColumnSummary::Categorical { name, summary: s } => {
                writeln!(f, "count  {:>8}", s.count)?;
                writeln!(f, "unique {:>8}", s.unique)?;
                match s.top {
                    Some(top) => writeln!(f, "top    {:>8}", top)?,
                    None => writeln!(f, "top    {:>8}", "NaN")?,
                }
                writeln!(f, "freq   {:>8}", s.freq)?;
                write!(f, "Name: {}, dtype: category", name)
            }
        }
    }
}

/// Summarize a numeric sample
pub fn describe(data: &[f64]) -> Result<NumericSummary> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(Error::InvalidValue(
            "Cannot compute statistics for empty data".into(),
        ));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        (sorted.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    Ok(NumericSummary {
        count,
        mean,
        std,
        min: sorted[0],
        q1: percentile(&sorted, 25.0)?,
        median: percentile(&sorted, 50.0)?,
        q3: percentile(&sorted, 75.0)?,
        max: sorted[count - 1],
    })
}

/// Summarize a categorical column
pub fn describe_categorical(cat: &Categorical<i64>) -> CategoricalSummary {
    let counts = cat.value_counts();
    let count = counts.iter().map(|(_, n)| n).sum();
    let unique = counts.iter().filter(|(_, n)| *n > 0).count();

    // First category in scale order wins ties
    let mut top: Option<(i64, usize)> = None;
    for &(category, n) in &counts {
        if n > 0 && top.map_or(true, |(_, best)| n > best) {
            top = Some((category, n));
        }
    }

    CategoricalSummary {
        count,
        unique,
        top: top.map(|(category, _)| category),
        freq: top.map_or(0, |(_, n)| n),
    }
}

/// Summarize every column of the frame, in column order
pub fn describe_frame(df: &SurveyFrame) -> Result<Vec<ColumnSummary>> {
    df.column_names()
        .iter()
        .map(|name| {
            Ok(match df.column(name)? {
                ColumnData::Numeric(values) => ColumnSummary::Numeric {
                    name: name.clone(),
                    summary: describe(values)?,
                },
                ColumnData::Categorical(cat) => ColumnSummary::Categorical {
                    name: name.clone(),
                    summary: describe_categorical(cat),
                },
            })
        })
        .collect()
}

/// Calculate percentile of sorted data (linear interpolation)
pub fn percentile(sorted_data: &[f64], p: f64) -> Result<f64> {
    if sorted_data.is_empty() {
        return Err(Error::InvalidValue(
            "Cannot compute percentile for empty data".into(),
        ));
    }

    if !(0.0..=100.0).contains(&p) {
        return Err(Error::InvalidValue(
            "Percentile must be between 0 and 100".into(),
        ));
    }

    let n = sorted_data.len();
    let index = (p / 100.0) * (n - 1) as f64;
    let lower_index = index.floor() as usize;
    let upper_index = index.ceil() as usize;

    if lower_index == upper_index {
        Ok(sorted_data[lower_index])
    } else {
        let weight = index - lower_index as f64;
        Ok(sorted_data[lower_index] * (1.0 - weight) + sorted_data[upper_index] * weight)
    }
}

/// Binned counts with `edges.len() == counts.len() + 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into the given monotonically increasing edges
    ///
    /// Bins are half-open except the last, which also includes its right
    /// edge. Values outside `[edges[0], edges[last]]` are ignored.
    pub fn with_edges(values: &[f64], edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidValue("A histogram needs at least one bin".into()));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidValue(
                "Histogram edges must be strictly increasing".into(),
            ));
        }

        let bins = edges.len() - 1;
        let first = edges[0];
        let last = edges[bins];
        let mut counts = vec![0usize; bins];

        for &v in values {
            if v.is_nan() || v < first || v > last {
                continue;
            }
            // partition_point gives the number of edges <= v
            let bin = edges.partition_point(|&e| e <= v).saturating_sub(1).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Histogram { edges, counts })
    }

    /// `bins` equal-width bins spanning the data range
    pub fn equal_width(values: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(Error::InvalidValue("Bin count must be positive".into()));
        }
        let (min, max) = finite_range(values)?;
        let (lo, hi) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };

        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        // Rounding can leave the last edge just below the maximum
        edges[bins] = hi;
        Self::with_edges(values, edges)
    }

    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Bin heights normalized so the histogram integrates to one
    pub fn density(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&c, w)| {
                if total == 0.0 {
                    0.0
                } else {
                    c as f64 / (total * (w[1] - w[0]))
                }
            })
            .collect()
    }

    /// Left edge of every bin
    pub fn left_edges(&self) -> &[f64] {
        &self.edges[..self.edges.len() - 1]
    }
}

/// Histogram of a categorical scale over unit bins `0, 1, ..., k + 2`
///
/// `k` is the number of categories. The padding bins on either side keep the
/// bar chart from starting or ending on a populated category.
pub fn category_histogram(cat: &Categorical<i64>) -> Result<Histogram> {
    let k = cat.categories().len();
    let edges = (0..=k + 2).map(|e| e as f64).collect();
    Histogram::with_edges(&cat.values_f64(), edges)
}

/// Density histogram used as a PMF estimate
///
/// The bin count is the integer span of the sample (`max - min`, at least
/// one), so integer-valued data such as ages gets roughly one bin per value.
pub fn pmf_histogram(values: &[f64]) -> Result<Histogram> {
    let (min, max) = finite_range(values)?;
    let bins = ((max - min).floor() as usize).max(1);
    Histogram::equal_width(values, bins)
}

/// Empirical CDF points `(x_(i), i / n)` for the sorted sample
pub fn empirical_cdf(values: &[f64]) -> Result<Vec<(f64, f64)>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(Error::Empty("No values for an empirical CDF".into()));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    Ok(sorted
        .into_iter()
        .enumerate()
        .map(|(i, x)| (x, i as f64 / n))
        .collect())
}

/// Sample skewness (biased, moment based)
pub fn skewness(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let mean = data.iter().sum::<f64>() / n;
    let m2 = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    let m3 = data.iter().map(|&x| (x - mean).powi(3)).sum::<f64>() / n;
    if m2 == 0.0 {
        0.0
    } else {
        m3 / m2.powf(1.5)
    }
}

fn finite_range(values: &[f64]) -> Result<(f64, f64)> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite()).peekable();
    if finite.peek().is_none() {
        return Err(Error::Empty("No finite values to bin".into()));
    }
    Ok(finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    }))
}
