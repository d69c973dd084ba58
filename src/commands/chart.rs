use crate::models::{ChartConfig, ChartFormat};
use crate::services::chart_service;
use crate::utils::page::{Page, CHART_CONTAINER_ID};
use crate::utils::Settings;
use std::fs;

pub fn execute(
    settings: &Settings,
    csv: Option<&str>,
    out: Option<&str>,
    format: &str,
) -> Result<(), String> {
    tracing::info!("📈 Chart command called (csv: {:?}, format: {})", csv, format);

    let format = ChartFormat::parse(format)?;
    let csv_path = csv.unwrap_or(&settings.returns_csv_path);
    let out_path = out
        .map(str::to_string)
        .unwrap_or_else(|| format!("returns-chart.{}", format.extension()));

    let config = ChartConfig {
        width: settings.chart_width,
        height: settings.chart_height,
        ..ChartConfig::default()
    };

    let bytes = match format {
        ChartFormat::Svg => {
            let points = chart_service::load_return_points(csv_path).map_err(|e| e.to_string())?;
            let page = Page::returns_page();
            let container = page
                .get_element_by_id(CHART_CONTAINER_ID)
                .ok_or("Chart container missing from page".to_string())?;
            chart_service::render_into(&container, &points, &config).map_err(|e| e.to_string())?;
            container.inner_html().into_bytes()
        }
        ChartFormat::Png => chart_service::load_and_render(csv_path, &config, format)
            .map_err(|e| e.to_string())?,
    };

    fs::write(&out_path, bytes).map_err(|e| format!("Failed to write {}: {}", out_path, e))?;
    tracing::info!("Rendered returns chart from {} to {}", csv_path, out_path);
    Ok(())
}
