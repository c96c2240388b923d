//! PNG rendering with Plotters

use std::path::Path;

use crate::core::error::Result;
use crate::vis::Chart;

#[cfg(feature = "visualization")]
pub use self::backend::save_png;

/// Backend module for plotters-based rendering
#[cfg(feature = "visualization")]
pub mod backend {
    use super::*;
    use crate::vis::{step_outline, ChartSeries};
    use plotters::prelude::*;

    /// Render `chart` as a PNG image at `path`
    pub fn save_png<P: AsRef<Path>>(chart: &Chart, path: P) -> Result<()> {
        let settings = &chart.settings;
        let ((x_min, x_max), (y_min, y_max)) = chart.bounds()?;

        let root = BitMapBackend::new(path.as_ref(), (settings.width, settings.height))
            .into_drawing_area();

        root.fill(&WHITE)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&settings.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        if settings.show_grid {
            ctx.configure_mesh()
                .x_desc(&settings.x_label)
                .y_desc(&settings.y_label)
                .draw()?;
        } else {
            ctx.configure_mesh()
                .x_desc(&settings.x_label)
                .y_desc(&settings.y_label)
                .disable_mesh()
                .draw()?;
        }

        for (i, series) in chart.series.iter().enumerate() {
            let (r, g, b) = settings.color(i);
            let color = RGBColor(r, g, b);

            let anno = match series {
                ChartSeries::Bars { bars, .. } => ctx.draw_series(bars.iter().map(
                    |&(x0, x1, h)| Rectangle::new([(x0, 0.0), (x1, h)], color.mix(0.75).filled()),
                ))?,
                ChartSeries::Steps { edges, heights, .. } => ctx.draw_series(LineSeries::new(
                    step_outline(edges, heights),
                    color.stroke_width(2),
                ))?,
                ChartSeries::Line { points, .. } => {
                    ctx.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                }
                ChartSeries::Points {
                    points,
                    radius,
                    alpha,
                    ..
                } => {
                    let style = color.mix(*alpha).filled();
                    ctx.draw_series(
                        points
                            .iter()
                            .map(|&p| Circle::new(p, *radius as i32, style)),
                    )?
                }
            };

            if settings.show_legend {
                anno.label(series.label()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                });
            }
        }

        if settings.show_legend {
            ctx.configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        log::info!("Saved chart '{}' to {}", settings.title, path.as_ref().display());

        Ok(())
    }
}

/// Fallback implementation when visualization is not available
#[cfg(not(feature = "visualization"))]
pub fn save_png<P: AsRef<Path>>(chart: &Chart, _path: P) -> Result<()> {
    Err(crate::core::error::Error::FeatureNotAvailable(format!(
        "Cannot render '{}': recompile with --features visualization",
        chart.settings.title
    )))
}

#[cfg(all(test, feature = "visualization"))]
mod tests {
    use super::*;
    use crate::vis::{ChartSeries, PlotSettings};
    use tempfile::tempdir;

    #[test]
    fn test_save_png_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");

        let chart = Chart::new(PlotSettings::new("Test").size(320, 240).legend(true))
            .with_series(ChartSeries::Bars {
                label: "bars".into(),
                bars: vec![(0.0, 1.0, 2.0), (1.0, 2.0, 3.0)],
            })
            .with_series(ChartSeries::Line {
                label: "line".into(),
                points: vec![(0.0, 0.0), (2.0, 3.0)],
            })
            .with_series(ChartSeries::Points {
                label: "points".into(),
                points: vec![(0.5, 1.0), (1.5, 2.0)],
                radius: 4,
                alpha: 0.3,
            });

        save_png(&chart, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_save_png_with_caption_labels_and_legend() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labelled.png");

        let chart = Chart::new(
            PlotSettings::new("Histogram of Variable: resp_age")
                .labels("resp_age", "Frequency")
                .size(400, 300)
                .legend(true),
        )
        .with_series(ChartSeries::Steps {
            label: "More Liberal".into(),
            edges: vec![18.0, 30.0, 45.0, 60.0],
            heights: vec![0.02, 0.03, 0.01],
        });

        save_png(&chart, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_empty_chart_is_an_error() {
        let dir = tempdir().unwrap();
        let chart = Chart::new(PlotSettings::default());
        assert!(save_png(&chart, dir.path().join("empty.png")).is_err());
    }
}
