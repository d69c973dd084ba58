use std::fs;
use std::sync::Arc;

use crate::api::portfoliohut::PortfolioHutClient;
use crate::models::FetchOutcome;
use crate::services::fragment_service::FragmentLoader;
use crate::services::plot_service::SvgPlotter;
use crate::utils::page::{Page, PageSpinner, CONTENT_ID, RETURNS_GRAPH_ID, SPINNER_CLASS};
use crate::utils::Settings;

pub async fn execute(settings: &Settings, query: &str, out: &str) -> Result<(), String> {
    tracing::info!("📉 Returns graph command called (query: {:?})", query);

    let client = PortfolioHutClient::new(&settings.base_url).map_err(|e| e.to_string())?;
    let loader = FragmentLoader::new(client);

    let page = Page::returns_page();
    let content = page
        .get_element_by_id(CONTENT_ID)
        .ok_or("Content container missing from page".to_string())?;
    let target = page
        .get_element_by_id(RETURNS_GRAPH_ID)
        .ok_or("Returns graph container missing from page".to_string())?;
    let spinner = Arc::new(PageSpinner::new(page.clone(), SPINNER_CLASS, content));
    let plotter = Arc::new(SvgPlotter {
        width: settings.chart_width,
        height: settings.chart_height,
    });

    let request = loader.display_portfolio_graph(query, plotter, Arc::new(target.clone()), spinner);
    tracing::debug!("Waiting on {} request", request.endpoint().name());
    let outcome = request.settled().await;

    match outcome {
        FetchOutcome::Applied => {
            fs::write(out, target.inner_html())
                .map_err(|e| format!("Failed to write {}: {}", out, e))?;
            tracing::info!("Returns graph written to {}", out);
            Ok(())
        }
        FetchOutcome::Ignored { status } => Err(format!("Server answered {} for returns graph", status)),
        FetchOutcome::Failed { reason } => Err(reason),
    }
}
