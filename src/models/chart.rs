//! Return chart models

use chrono::NaiveDate;
use serde::Deserialize;

/// A single point on the returns chart
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Raw CSV record before date/number parsing
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRow {
    #[serde(rename = "DATE")]
    pub date: String,
    #[serde(rename = "Returns")]
    pub returns: String,
}

/// How the series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
}

/// Output encoding for a rendered chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Svg,
    Png,
}

impl ChartFormat {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "svg" => Ok(ChartFormat::Svg),
            "png" => Ok(ChartFormat::Png),
            other => Err(format!("❌ Unknown chart format: '{}'. Supported: svg, png", other)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
        }
    }
}

/// Layout and styling of the returns chart
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub title: String,
    pub subtitle: String,
    pub y_axis_title: String,
    pub y_prefix: String,
    pub y_suffix: String,
    /// chrono format string for x-axis labels and crosshair values
    pub x_value_format: String,
    /// Crosshairs are drawn through the latest data point
    pub x_crosshair: bool,
    pub y_crosshair: bool,
    pub series: SeriesKind,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio Returns".to_string(),
            subtitle: String::new(),
            y_axis_title: "Return percentage".to_string(),
            y_prefix: String::new(),
            y_suffix: "%".to_string(),
            x_value_format: "%b %Y".to_string(),
            x_crosshair: true,
            y_crosshair: true,
            series: SeriesKind::Line,
            width: 1024,
            height: 576,
        }
    }
}

impl ChartConfig {
    /// Format a y value with the configured prefix and suffix
    pub fn format_y(&self, value: f64) -> String {
        format!("{}{:.2}{}", self.y_prefix, value, self.y_suffix)
    }

    pub fn format_x(&self, date: &NaiveDate) -> String {
        date.format(&self.x_value_format).to_string()
    }
}
