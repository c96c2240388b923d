//! Terminal previews with textplots

use crate::core::error::Result;
use crate::vis::Chart;

#[cfg(feature = "visualization")]
use crate::core::error::Error;
#[cfg(feature = "visualization")]
use crate::vis::{step_outline, ChartSeries};
#[cfg(feature = "visualization")]
use textplots::{Chart as TextChart, Plot, Shape};

/// Terminal size used for previews (braille cells are 2x4 pixels)
pub const PREVIEW_WIDTH: u32 = 160;
pub const PREVIEW_HEIGHT: u32 = 60;

/// Render `chart` as a braille text plot
#[cfg(feature = "visualization")]
pub fn render_text(chart: &Chart) -> Result<String> {
    let ((x_min, x_max), (y_min, y_max)) = chart.bounds()?;

    // Shapes borrow their point buffers, so convert everything first
    let buffers: Vec<(bool, Vec<(f32, f32)>)> = chart
        .series
        .iter()
        .map(|series| match series {
            ChartSeries::Bars { bars, .. } => (
                false,
                bars.iter()
                    .flat_map(|&(x0, x1, h)| [(x0, 0.0), (x0, h), (x1, h), (x1, 0.0)])
                    .map(|(x, y)| (x as f32, y as f32))
                    .collect(),
            ),
            ChartSeries::Steps { edges, heights, .. } => (
                false,
                step_outline(edges, heights)
                    .into_iter()
                    .map(|(x, y)| (x as f32, y as f32))
                    .collect(),
            ),
            ChartSeries::Line { points, .. } => (
                false,
                points.iter().map(|&(x, y)| (x as f32, y as f32)).collect(),
            ),
            ChartSeries::Points { points, .. } => (
                true,
                points.iter().map(|&(x, y)| (x as f32, y as f32)).collect(),
            ),
        })
        .collect();

    let shapes: Vec<Shape> = buffers
        .iter()
        .map(|(scatter, points)| {
            if *scatter {
                Shape::Points(points)
            } else {
                Shape::Lines(points)
            }
        })
        .collect();

    let (first, rest) = shapes
        .split_first()
        .ok_or_else(|| Error::Empty("Nothing to preview".into()))?;

    let mut text_chart = TextChart::new_with_y_range(
        PREVIEW_WIDTH,
        PREVIEW_HEIGHT,
        x_min as f32,
        x_max as f32,
        y_min as f32,
        y_max as f32,
    );
    let mut plotted = text_chart.lineplot(first);
    for shape in rest {
        plotted = plotted.lineplot(shape);
    }
    plotted.axis();
    plotted.figures();

    let settings = &chart.settings;
    Ok(format!(
        "=== {} ===\nX-axis: {}, Y-axis: {}\n\n{}",
        settings.title, settings.x_label, settings.y_label, plotted
    ))
}

/// Fallback implementation when visualization is not available
#[cfg(not(feature = "visualization"))]
pub fn render_text(chart: &Chart) -> Result<String> {
    Err(crate::core::error::Error::FeatureNotAvailable(format!(
        "Cannot preview '{}': recompile with --features visualization",
        chart.settings.title
    )))
}

/// Print the terminal preview of `chart` to stdout
pub fn preview(chart: &Chart) -> Result<()> {
    println!("{}", render_text(chart)?);
    Ok(())
}
