use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use plotters::prelude::*;
use tracing::debug;

use crate::models::{ChartConfig, ChartFormat, ReturnPoint, ReturnRow, SeriesKind};
use crate::utils::errors::ChartError;
use crate::utils::page::Container;

/// Where the returns page expects its CSV export
pub const DEFAULT_RETURNS_CSV: &str = "./data/transactions - transactions.csv";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a calendar date from a CSV `DATE` field
/// Supported: 2020-01-31, 2020/01/31, 01/31/2020, and ISO date-times (date part kept)
pub fn parse_return_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse a finite numeric return, tolerating whitespace and a trailing '%'
pub fn parse_return_value(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pad a value range for plotting. A flat range gets a fixed margin.
///
/// Returns `None` when the bounds, their span or the padded range are not finite.
pub fn padded_range(min: f64, max: f64) -> Option<(f64, f64)> {
    let span = max - min;
    if !span.is_finite() || span < 0.0 {
        return None;
    }
    let padding = if span < 1e-8 { 1.0 } else { span * 0.1 };
    let (low, high) = (min - padding, max + padding);
    (low.is_finite() && high.is_finite()).then_some((low, high))
}

/// Read return points from CSV data with `DATE` and `Returns` columns, in file order
pub fn read_return_points<R: Read>(reader: R) -> Result<Vec<ReturnPoint>, ChartError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for (idx, result) in csv_reader.deserialize::<ReturnRow>().enumerate() {
        let row = result?;
        let row_number = idx + 1;
        debug!(row = row_number, date = %row.date, returns = %row.returns, "returns row");

        let date = parse_return_date(&row.date).ok_or_else(|| ChartError::InvalidDate {
            row: row_number,
            value: row.date.clone(),
        })?;
        let value = parse_return_value(&row.returns).ok_or_else(|| ChartError::InvalidReturn {
            row: row_number,
            value: row.returns.clone(),
        })?;

        points.push(ReturnPoint { date, value });
    }

    Ok(points)
}

/// Load return points from a CSV file on disk
pub fn load_return_points<P: AsRef<Path>>(path: P) -> Result<Vec<ReturnPoint>, ChartError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ChartError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let points = read_return_points(file)?;
    debug!("Loaded {} return points from {}", points.len(), path.display());
    Ok(points)
}

fn to_utc(date: NaiveDate) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(chrono::NaiveTime::MIN), Utc)
}

type AxisRanges = ((DateTime<Utc>, DateTime<Utc>), (f64, f64));

/// Compute padded axis ranges; a single point still gets a non-empty range
fn axis_ranges(points: &[ReturnPoint]) -> Result<AxisRanges, ChartError> {
    let first = points.first().ok_or(ChartError::NoData)?;
    let mut x_min = to_utc(first.date);
    let mut x_max = x_min;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for p in points {
        let ts = to_utc(p.date);
        x_min = x_min.min(ts);
        x_max = x_max.max(ts);
        y_min = y_min.min(p.value);
        y_max = y_max.max(p.value);
    }

    if x_min == x_max {
        x_min -= Duration::days(15);
        x_max += Duration::days(15);
    }

    let y_range = padded_range(y_min, y_max).ok_or_else(|| {
        ChartError::Render(format!("Returns from {} to {} cannot be plotted", y_min, y_max))
    })?;

    Ok(((x_min, x_max), y_range))
}

/// Text shown next to the crosshair marker
fn crosshair_label(config: &ChartConfig, point: &ReturnPoint) -> String {
    format!("{}: {}", config.format_x(&point.date), config.format_y(point.value))
}

fn draw_returns<DB: DrawingBackend>(
    root: DrawingArea<DB, plotters::coord::Shift>,
    points: &[ReturnPoint],
    ranges: AxisRanges,
    config: &ChartConfig,
) -> Result<(), ChartError> {
    root.fill(&WHITE)
        .map_err(|e| ChartError::Render(format!("Failed to fill canvas: {}", e)))?;

    let root = if config.subtitle.is_empty() {
        root
    } else {
        let (top, rest) = root.split_vertically(70);
        top.titled(&config.title, ("sans-serif", 32.0))
            .and_then(|area| {
                let style: TextStyle = ("sans-serif", 18.0).into_font().into();
                area.draw_text(&config.subtitle, &style, (10, 0)).map(|_| area)
            })
            .map_err(|e| ChartError::Render(format!("Failed to draw titles: {}", e)))?;
        rest
    };

    let ((x_min, x_max), (y_min, y_max)) = ranges;

    let mut builder = ChartBuilder::on(&root);
    if config.subtitle.is_empty() {
        builder.caption(&config.title, ("sans-serif", 32.0).into_font());
    }
    let mut chart = builder
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| ChartError::Render(format!("Failed to build chart: {}", e)))?;

    let x_fmt = |ts: &DateTime<Utc>| config.format_x(&ts.date_naive());
    let y_fmt = |v: &f64| config.format_y(*v);

    chart
        .configure_mesh()
        .y_desc(&config.y_axis_title)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()
        .map_err(|e| ChartError::Render(format!("Failed to draw mesh: {}", e)))?;

    match config.series {
        SeriesKind::Line => {
            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|p| (to_utc(p.date), p.value)),
                    &BLUE,
                ))
                .map_err(|e| ChartError::Render(format!("Failed to draw line: {}", e)))?;
        }
    }

    // Crosshair snapped to the latest point in file order
    if let Some(last) = points.last() {
        let at = (to_utc(last.date), last.value);
        let style = BLACK.mix(0.4);

        if config.x_crosshair {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(at.0, y_min), (at.0, y_max)],
                    &style,
                )))
                .map_err(|e| ChartError::Render(format!("Failed to draw crosshair: {}", e)))?;
        }
        if config.y_crosshair {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x_min, at.1), (x_max, at.1)],
                    &style,
                )))
                .map_err(|e| ChartError::Render(format!("Failed to draw crosshair: {}", e)))?;
        }
        if config.x_crosshair || config.y_crosshair {
            let label = crosshair_label(config, last);
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at(at)
                        + Circle::new((0, 0), 3, BLUE.filled())
                        + Text::new(label, (-120, -18), ("sans-serif", 14.0).into_font()),
                ))
                .map_err(|e| ChartError::Render(format!("Failed to draw crosshair label: {}", e)))?;
        }
    }

    root.present()
        .map_err(|e| ChartError::Render(format!("Failed to render chart: {}", e)))?;

    Ok(())
}

/// Render the returns chart and return the encoded image
pub fn render_return_chart(
    points: &[ReturnPoint],
    config: &ChartConfig,
    format: ChartFormat,
) -> Result<Vec<u8>, ChartError> {
    let ranges = axis_ranges(points)?;

    match format {
        ChartFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (config.width, config.height))
                    .into_drawing_area();
                draw_returns(root, points, ranges, config)?;
            }
            Ok(svg.into_bytes())
        }
        ChartFormat::Png => {
            // BitMapBackend only encodes PNG when writing to a path
            let temp_file = std::env::temp_dir().join(format!(
                "portfoliohut_returns_{}_{}.png",
                std::process::id(),
                Utc::now().timestamp_nanos_opt().unwrap_or_default()
            ));
            {
                let root = BitMapBackend::new(&temp_file, (config.width, config.height))
                    .into_drawing_area();
                draw_returns(root, points, ranges, config)?;
            }
            let image_data = std::fs::read(&temp_file)?;
            let _ = std::fs::remove_file(&temp_file);
            Ok(image_data)
        }
    }
}

/// Render as SVG straight into the chart container
pub fn render_into(
    container: &dyn Container,
    points: &[ReturnPoint],
    config: &ChartConfig,
) -> Result<(), ChartError> {
    let svg = render_return_chart(points, config, ChartFormat::Svg)?;
    let svg = String::from_utf8(svg).map_err(|e| ChartError::Render(e.to_string()))?;
    container.replace_inner_html(&svg);
    Ok(())
}

/// Load every row of the returns CSV, then render the chart once
pub fn load_and_render<P: AsRef<Path>>(
    path: P,
    config: &ChartConfig,
    format: ChartFormat,
) -> Result<Vec<u8>, ChartError> {
    let points = load_return_points(path)?;
    render_return_chart(&points, config, format)
}
