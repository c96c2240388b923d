//! Chart settings shared by the image and terminal renderers

use serde::{Deserialize, Serialize};

/// Default series colours: blue, orange, green, red, purple
pub const DEFAULT_PALETTE: [(u8, u8, u8); 5] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
];

/// Layout and styling for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Title
    pub title: String,
    /// X-axis label
    pub x_label: String,
    /// Y-axis label
    pub y_label: String,
    /// Width of the image (pixels)
    pub width: u32,
    /// Height of the image (pixels)
    pub height: u32,
    /// Fixed x-axis range, computed from the data when absent
    pub x_range: Option<(f64, f64)>,
    /// Fixed y-axis range, computed from the data when absent
    pub y_range: Option<(f64, f64)>,
    /// Show legend
    pub show_legend: bool,
    /// Show grid
    pub show_grid: bool,
    /// Colours assigned to series in order
    pub color_palette: Vec<(u8, u8, u8)>,
}

impl Default for PlotSettings {
    fn default() -> Self {
        PlotSettings {
            title: "Plot".to_string(),
            x_label: "X".to_string(),
            y_label: "Y".to_string(),
            width: 800,
            height: 600,
            x_range: None,
            y_range: None,
            show_legend: false,
            show_grid: true,
            color_palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl PlotSettings {
    pub fn new(title: impl Into<String>) -> Self {
        PlotSettings {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn x_range(mut self, min: f64, max: f64) -> Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    pub fn palette(mut self, palette: Vec<(u8, u8, u8)>) -> Self {
        if !palette.is_empty() {
            self.color_palette = palette;
        }
        self
    }

    /// Colour for the `index`-th series, cycling through the palette
    pub fn color(&self, index: usize) -> (u8, u8, u8) {
        if self.color_palette.is_empty() {
            DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
        } else {
            self.color_palette[index % self.color_palette.len()]
        }
    }
}
