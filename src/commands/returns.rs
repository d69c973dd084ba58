use std::sync::Arc;

use crate::api::portfoliohut::PortfolioHutClient;
use crate::models::FetchOutcome;
use crate::services::fragment_service::FragmentLoader;
use crate::utils::page::{Page, PageSpinner, CONTENT_ID, PROFILE_RETURNS_ID, SPINNER_CLASS};
use crate::utils::Settings;

pub async fn execute(settings: &Settings, username: &str, query: &str) -> Result<(), String> {
    tracing::info!("📊 Profile returns command called for {} (query: {:?})", username, query);

    let client = PortfolioHutClient::new(&settings.base_url).map_err(|e| e.to_string())?;
    let loader = FragmentLoader::new(client);

    let page = Page::returns_page();
    let content = page
        .get_element_by_id(CONTENT_ID)
        .ok_or("Content container missing from page".to_string())?;
    let container = page
        .get_element_by_id(PROFILE_RETURNS_ID)
        .ok_or("Profile returns container missing from page".to_string())?;
    let spinner = Arc::new(PageSpinner::new(page.clone(), SPINNER_CLASS, content));

    let request = loader.display_profile_returns(username, query, Arc::new(container.clone()), spinner);
    tracing::debug!("Waiting on {} request", request.endpoint().name());
    let outcome = request.settled().await;

    match outcome {
        FetchOutcome::Applied => {
            println!("{}", container.inner_html());
            Ok(())
        }
        FetchOutcome::Ignored { status } => {
            Err(format!("Server answered {} for {}'s returns", status, username))
        }
        FetchOutcome::Failed { reason } => Err(reason),
    }
}
