//! Chart rendering
//!
//! Charts are described by a [`Chart`] value and rendered either to PNG with
//! plotters or to the terminal with textplots. Both renderers are behind the
//! `visualization` feature.

pub mod config;
pub mod plotters;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::stats::descriptive::Histogram;

pub use self::config::{PlotSettings, DEFAULT_PALETTE};
pub use self::plotters::save_png;
pub use self::text::{preview, render_text};

/// One data series drawn on a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartSeries {
    /// Filled bars given as (left, right, height)
    Bars {
        label: String,
        bars: Vec<(f64, f64, f64)>,
    },
    /// Histogram outline with `edges.len() == heights.len() + 1`
    Steps {
        label: String,
        edges: Vec<f64>,
        heights: Vec<f64>,
    },
    /// Connected line
    Line {
        label: String,
        points: Vec<(f64, f64)>,
    },
    /// Markers with opacity in (0, 1]
    Points {
        label: String,
        points: Vec<(f64, f64)>,
        radius: u32,
        alpha: f64,
    },
}

impl ChartSeries {
    /// Bars from a histogram's counts
    pub fn histogram_counts(label: impl Into<String>, hist: &Histogram) -> Self {
        ChartSeries::Bars {
            label: label.into(),
            bars: hist
                .edges
                .windows(2)
                .zip(&hist.counts)
                .map(|(e, &c)| (e[0], e[1], c as f64))
                .collect(),
        }
    }

    /// Bars from a histogram's density
    pub fn histogram_density(label: impl Into<String>, hist: &Histogram) -> Self {
        ChartSeries::Bars {
            label: label.into(),
            bars: hist
                .edges
                .windows(2)
                .zip(hist.density())
                .map(|(e, d)| (e[0], e[1], d))
                .collect(),
        }
    }

    /// Step outline of a histogram's density
    pub fn density_steps(label: impl Into<String>, hist: &Histogram) -> Self {
        ChartSeries::Steps {
            label: label.into(),
            edges: hist.edges.clone(),
            heights: hist.density(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ChartSeries::Bars { label, .. }
            | ChartSeries::Steps { label, .. }
            | ChartSeries::Line { label, .. }
            | ChartSeries::Points { label, .. } => label,
        }
    }

    /// Every (x, y) corner the series reaches, bars and steps include y = 0
    pub fn extent_points(&self) -> Vec<(f64, f64)> {
        match self {
            ChartSeries::Bars { bars, .. } => bars
                .iter()
                .flat_map(|&(x0, x1, h)| [(x0, 0.0), (x1, h)])
                .collect(),
            ChartSeries::Steps { edges, heights, .. } => step_outline(edges, heights),
            ChartSeries::Line { points, .. } | ChartSeries::Points { points, .. } => {
                points.clone()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ChartSeries::Steps { edges, heights, .. } if edges.len() != heights.len() + 1 => {
                Err(Error::DimensionMismatch(format!(
                    "Step series '{}' needs one more edge than heights",
                    self.label()
                )))
            }
            ChartSeries::Points { alpha, .. } if !(*alpha > 0.0 && *alpha <= 1.0) => {
                Err(Error::InvalidValue(format!(
                    "Marker opacity {} is outside (0, 1]",
                    alpha
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Outline of a step histogram starting and ending on the x axis
pub fn step_outline(edges: &[f64], heights: &[f64]) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(heights.len() * 2 + 2);
    if let Some(&first) = edges.first() {
        points.push((first, 0.0));
    }
    for (e, &h) in edges.windows(2).zip(heights) {
        points.push((e[0], h));
        points.push((e[1], h));
    }
    if let Some(&last) = edges.last() {
        points.push((last, 0.0));
    }
    points
}

/// A chart: settings plus the series drawn on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub settings: PlotSettings,
    pub series: Vec<ChartSeries>,
}

impl Chart {
    pub fn new(settings: PlotSettings) -> Self {
        Chart {
            settings,
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    /// Axis ranges: fixed ranges from the settings, otherwise the data
    /// extent padded by 5%
    pub fn bounds(&self) -> Result<((f64, f64), (f64, f64))> {
        if self.series.is_empty() {
            return Err(Error::Empty(format!(
                "Chart '{}' has no series",
                self.settings.title
            )));
        }
        for series in &self.series {
            series.validate()?;
        }

        let points: Vec<(f64, f64)> = self
            .series
            .iter()
            .flat_map(|s| s.extent_points())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if points.is_empty() {
            return Err(Error::Empty(format!(
                "Chart '{}' has no finite data",
                self.settings.title
            )));
        }

        let padded = |values: Vec<f64>| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let span = if max > min { max - min } else { 1.0 };
            (min - span * 0.05, max + span * 0.05)
        };

        let x = self
            .settings
            .x_range
            .unwrap_or_else(|| padded(points.iter().map(|p| p.0).collect()));
        let y = self
            .settings
            .y_range
            .unwrap_or_else(|| padded(points.iter().map(|p| p.1).collect()));
        Ok((x, y))
    }
}
