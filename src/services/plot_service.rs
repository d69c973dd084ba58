use chrono::{DateTime, Duration, NaiveDate, Utc};
use plotters::prelude::*;
use serde_json::Value;
use tracing::debug;

use crate::models::{Figure, Trace};
use crate::services::chart_service::{padded_range, parse_return_date};
use crate::utils::errors::PlotError;
use crate::utils::page::Container;

/// The plotting call: draws a JSON figure into a container, replacing what was there
pub trait Plotter: Send + Sync {
    fn new_plot(&self, target: &dyn Container, figure: Value) -> Result<(), PlotError>;
}

/// Renders figures as inline SVG
#[derive(Debug, Clone)]
pub struct SvgPlotter {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgPlotter {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 480,
        }
    }
}

impl Plotter for SvgPlotter {
    fn new_plot(&self, target: &dyn Container, figure: Value) -> Result<(), PlotError> {
        let figure: Figure = serde_json::from_value(figure)
            .map_err(|e| PlotError::InvalidFigure(e.to_string()))?;
        let svg = render_figure_svg(&figure, self.width, self.height)?;
        target.replace_inner_html(&svg);
        Ok(())
    }
}

fn to_utc(date: NaiveDate) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(chrono::NaiveTime::MIN), Utc)
}

fn axis_date_label(ts: &DateTime<Utc>) -> String {
    ts.format("%b %Y").to_string()
}

/// Pair x dates with y values; entries with a null y or a non-date x are skipped
fn trace_points(trace: &Trace) -> Vec<(DateTime<Utc>, f64)> {
    trace
        .x
        .iter()
        .zip(trace.y.iter())
        .filter_map(|(x, y)| {
            let date = x.as_str().and_then(parse_return_date)?;
            y.map(|value| (to_utc(date), value))
        })
        .collect()
}

/// Render every visible trace of a figure as one line each
pub fn render_figure_svg(figure: &Figure, width: u32, height: u32) -> Result<String, PlotError> {
    let series: Vec<(String, Vec<(DateTime<Utc>, f64)>)> = figure
        .data
        .iter()
        .enumerate()
        .filter(|(_, trace)| trace.is_visible() && trace.is_line())
        .map(|(i, trace)| (trace.label(i), trace_points(trace)))
        .filter(|(_, points)| !points.is_empty())
        .collect();

    if series.is_empty() {
        return Err(PlotError::EmptyFigure);
    }

    let all = series.iter().flat_map(|(_, points)| points.iter());
    let (mut x_min, mut x_max) = (DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MIN_UTC);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in all {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    if x_min == x_max {
        x_min -= Duration::days(1);
        x_max += Duration::days(1);
    }
    let (y_low, y_high) = padded_range(y_min, y_max).ok_or_else(|| {
        PlotError::Render(format!("Values from {} to {} cannot be plotted", y_min, y_max))
    })?;

    debug!("Plotting {} trace(s)", series.len());

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| PlotError::Render(format!("Failed to fill canvas: {}", e)))?;

        let mut builder = ChartBuilder::on(&root);
        if let Some(title) = figure.layout.title_text() {
            builder.caption(title, ("sans-serif", 24.0).into_font());
        }
        let mut chart = builder
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_low..y_high)
            .map_err(|e| PlotError::Render(format!("Failed to build chart: {}", e)))?;

        chart
            .configure_mesh()
            .x_label_formatter(&axis_date_label)
            .draw()
            .map_err(|e| PlotError::Render(format!("Failed to draw mesh: {}", e)))?;

        for (i, (name, points)) in series.into_iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            chart
                .draw_series(LineSeries::new(points, &color))
                .map_err(|e| PlotError::Render(format!("Failed to draw trace: {}", e)))?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| PlotError::Render(format!("Failed to draw legend: {}", e)))?;

        root.present()
            .map_err(|e| PlotError::Render(format!("Failed to render plot: {}", e)))?;
    }

    Ok(svg)
}
