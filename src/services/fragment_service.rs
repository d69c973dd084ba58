use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::portfoliohut::{Endpoint, PortfolioHutClient};
use crate::models::{FetchOutcome, RequestState};
use crate::services::plot_service::Plotter;
use crate::utils::errors::FragmentError;
use crate::utils::page::{Container, LoadingIndicator};

/// What to do with the body of a 200 response
pub trait SuccessHandler: Send + Sync {
    fn apply(&self, body: String) -> Result<(), FragmentError>;
}

/// Replace the container's inner HTML with the raw body (not sanitized)
pub struct ReplaceHtml {
    container: Arc<dyn Container>,
}

impl ReplaceHtml {
    pub fn new(container: Arc<dyn Container>) -> Self {
        ReplaceHtml { container }
    }
}

impl SuccessHandler for ReplaceHtml {
    fn apply(&self, body: String) -> Result<(), FragmentError> {
        self.container.replace_inner_html(&body);
        Ok(())
    }
}

/// Parse the body as JSON and hand it to exactly one plot call
pub struct ParseAndPlot {
    plotter: Arc<dyn Plotter>,
    target: Arc<dyn Container>,
}

impl ParseAndPlot {
    pub fn new(plotter: Arc<dyn Plotter>, target: Arc<dyn Container>) -> Self {
        ParseAndPlot { plotter, target }
    }
}

impl SuccessHandler for ParseAndPlot {
    fn apply(&self, body: String) -> Result<(), FragmentError> {
        let figure: Value = serde_json::from_str(&body)?;
        self.plotter.new_plot(self.target.as_ref(), figure)?;
        Ok(())
    }
}

/// GET `endpoint` once, apply the body on 200, then settle the indicator.
///
/// Every failure collapses into the returned outcome; the indicator is
/// settled whatever happened.
pub async fn fetch_and_apply(
    client: &PortfolioHutClient,
    endpoint: &Endpoint,
    querystring: &str,
    handler: &dyn SuccessHandler,
    indicator: &dyn LoadingIndicator,
) -> FetchOutcome {
    let outcome = match client.get(endpoint, querystring).await {
        Ok(response) if response.is_ok() => match handler.apply(response.body) {
            Ok(()) => {
                info!("Applied {} fragment", endpoint.name());
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!("Failed to apply {} fragment: {}", endpoint.name(), e);
                FetchOutcome::Failed { reason: e.to_string() }
            }
        },
        Ok(response) => {
            debug!("{} answered {}, leaving page as is", endpoint.name(), response.status);
            FetchOutcome::Ignored { status: response.status }
        }
        Err(e) => {
            warn!("{} request failed: {}", endpoint.name(), e);
            FetchOutcome::Failed { reason: e.to_string() }
        }
    };

    indicator.settle();
    outcome
}

/// Handle to a spawned fragment request. Dropping it does not cancel the request.
pub struct PendingRequest {
    endpoint: Endpoint,
    handle: JoinHandle<FetchOutcome>,
}

impl PendingRequest {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> RequestState {
        if self.handle.is_finished() {
            RequestState::Settled
        } else {
            RequestState::Pending
        }
    }

    /// Wait for the request to settle
    pub async fn settled(self) -> FetchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::Failed {
                reason: format!("request task ended abnormally: {}", e),
            },
        }
    }
}

/// Fire-and-forget fragment loading. Calls are independent: there is no
/// de-duplication, and whichever request settles last writes last.
#[derive(Clone)]
pub struct FragmentLoader {
    client: Arc<PortfolioHutClient>,
}

impl FragmentLoader {
    pub fn new(client: PortfolioHutClient) -> Self {
        FragmentLoader {
            client: Arc::new(client),
        }
    }

    /// Spawn one request onto the current tokio runtime and return immediately
    pub fn spawn_fetch(
        &self,
        endpoint: Endpoint,
        querystring: impl Into<String>,
        handler: Arc<dyn SuccessHandler>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> PendingRequest {
        let client = Arc::clone(&self.client);
        let querystring = querystring.into();
        let task_endpoint = endpoint.clone();

        let handle = tokio::spawn(async move {
            fetch_and_apply(
                &client,
                &task_endpoint,
                &querystring,
                handler.as_ref(),
                indicator.as_ref(),
            )
            .await
        });

        PendingRequest { endpoint, handle }
    }

    /// Load a profile's returns table into `container`
    pub fn display_profile_returns(
        &self,
        username: &str,
        querystring: &str,
        container: Arc<dyn Container>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> PendingRequest {
        self.spawn_fetch(
            Endpoint::profile_returns(username),
            querystring,
            Arc::new(ReplaceHtml::new(container)),
            indicator,
        )
    }

    /// Load the returns graph figure and plot it into `target`
    pub fn display_portfolio_graph(
        &self,
        querystring: &str,
        plotter: Arc<dyn Plotter>,
        target: Arc<dyn Container>,
        indicator: Arc<dyn LoadingIndicator>,
    ) -> PendingRequest {
        self.spawn_fetch(
            Endpoint::ReturnsGraph,
            querystring,
            Arc::new(ParseAndPlot::new(plotter, target)),
            indicator,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plot_service::SvgPlotter;
    use crate::utils::errors::PlotError;
    use crate::utils::page::{
        Element, Page, PageSpinner, CONTENT_ID, INVISIBLE_CLASS, PROFILE_RETURNS_ID,
        RETURNS_GRAPH_ID, SPINNER_CLASS,
    };
    use axum::extract::{Path, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    const GRAPH_JSON: &str = r#"{"data":[{"name":"My Returns","x":["2021-01-04"],"y":[1.5]}],"layout":{"title":"All"}}"#;

    const EXTREME_JSON: &str = r#"{"data":[{"x":["2021-01-04","2021-01-05"],"y":[1e308,-1e308]}]}"#;

    async fn profile_returns(
        Path(username): Path<String>,
        RawQuery(query): RawQuery,
    ) -> (StatusCode, String) {
        match (username.as_str(), query.as_deref()) {
            ("alice", Some("year=2021")) => (StatusCode::OK, "<table>...</table>".to_string()),
            ("alice", Some("speed=slow")) => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                (StatusCode::OK, "<table>slow</table>".to_string())
            }
            ("alice", Some("speed=fast")) => (StatusCode::OK, "<table>fast</table>".to_string()),
            ("alice", _) => (StatusCode::OK, "<table>all</table>".to_string()),
            ("private", _) => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            _ => (StatusCode::NOT_FOUND, "missing".to_string()),
        }
    }

    async fn returns_graph(RawQuery(query): RawQuery) -> (StatusCode, String) {
        match query.as_deref() {
            Some("broken=1") => (StatusCode::OK, "{not json".to_string()),
            Some("error=1") => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
            Some("extreme=1") => (StatusCode::OK, EXTREME_JSON.to_string()),
            _ => (StatusCode::OK, GRAPH_JSON.to_string()),
        }
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/profile-returns/:username", get(profile_returns))
            .route("/returns-graph", get(returns_graph))
            .route(
                "/hang/returns-graph",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    (StatusCode::OK, GRAPH_JSON.to_string())
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    struct Fixture {
        page: Page,
        content: Element,
        spinner: Arc<PageSpinner>,
    }

    fn fixture() -> Fixture {
        let page = Page::returns_page();
        let content = page.get_element_by_id(CONTENT_ID).unwrap();
        let spinner = Arc::new(PageSpinner::new(page.clone(), SPINNER_CLASS, content.clone()));
        Fixture { page, content, spinner }
    }

    #[derive(Default)]
    struct RecordingPlotter {
        calls: Mutex<Vec<Value>>,
    }

    impl Plotter for RecordingPlotter {
        fn new_plot(&self, target: &dyn Container, figure: Value) -> Result<(), PlotError> {
            target.replace_inner_html("plotted");
            self.calls.lock().unwrap().push(figure);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_profile_returns_replaces_container_and_removes_spinner() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let container = fx.page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();

        let outcome = loader
            .display_profile_returns("alice", "?year=2021", Arc::new(container.clone()), fx.spinner.clone())
            .settled()
            .await;

        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(container.inner_html(), "<table>...</table>");
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
        assert!(!fx.content.has_class(INVISIBLE_CLASS));
    }

    #[tokio::test]
    async fn test_non_200_leaves_container_unchanged() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let container = fx.page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();
        container.set_inner_html("<p>old</p>");

        let outcome = loader
            .display_profile_returns("private", "", Arc::new(container.clone()), fx.spinner.clone())
            .settled()
            .await;

        assert_eq!(outcome, FetchOutcome::Ignored { status: 403 });
        assert_eq!(container.inner_html(), "<p>old</p>");
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
        assert!(!fx.content.has_class(INVISIBLE_CLASS));
    }

    #[tokio::test]
    async fn test_graph_200_makes_exactly_one_plot_call() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let target = fx.page.get_element_by_id(RETURNS_GRAPH_ID).unwrap();
        let plotter = Arc::new(RecordingPlotter::default());

        let outcome = loader
            .display_portfolio_graph("", plotter.clone(), Arc::new(target.clone()), fx.spinner.clone())
            .settled()
            .await;

        assert_eq!(outcome, FetchOutcome::Applied);
        let calls = plotter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], serde_json::from_str::<Value>(GRAPH_JSON).unwrap());
        assert_eq!(calls[0]["data"][0]["name"], json!("My Returns"));
        assert_eq!(target.inner_html(), "plotted");
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
    }

    #[tokio::test]
    async fn test_graph_malformed_json_skips_plot() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let target = fx.page.get_element_by_id(RETURNS_GRAPH_ID).unwrap();
        let plotter = Arc::new(RecordingPlotter::default());

        let outcome = loader
            .display_portfolio_graph("?broken=1", plotter.clone(), Arc::new(target.clone()), fx.spinner.clone())
            .settled()
            .await;

        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert!(plotter.calls.lock().unwrap().is_empty());
        assert_eq!(target.inner_html(), "");
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
    }

    #[tokio::test]
    async fn test_graph_that_cannot_be_plotted_still_settles() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let target = fx.page.get_element_by_id(RETURNS_GRAPH_ID).unwrap();
        target.set_inner_html("previous");

        let outcome = loader
            .display_portfolio_graph(
                "?extreme=1",
                Arc::new(SvgPlotter::default()),
                Arc::new(target.clone()),
                fx.spinner.clone(),
            )
            .settled()
            .await;

        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert_eq!(target.inner_html(), "previous");
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
        assert!(!fx.content.has_class(INVISIBLE_CLASS));
    }

    #[tokio::test]
    async fn test_graph_server_error_skips_plot() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let target = fx.page.get_element_by_id(RETURNS_GRAPH_ID).unwrap();
        let plotter = Arc::new(RecordingPlotter::default());

        let outcome = loader
            .display_portfolio_graph("?error=1", plotter.clone(), Arc::new(target), fx.spinner.clone())
            .settled()
            .await;

        assert_eq!(outcome, FetchOutcome::Ignored { status: 500 });
        assert!(plotter.calls.lock().unwrap().is_empty());
        assert!(!fx.content.has_class(INVISIBLE_CLASS));
    }

    #[tokio::test]
    async fn test_transport_failure_still_removes_spinner() {
        // Bind then drop so the port refuses connections
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let loader = FragmentLoader::new(PortfolioHutClient::new(&format!("http://{}", addr)).unwrap());
        let fx = fixture();
        let container = fx.page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();

        let outcome = loader
            .display_profile_returns("alice", "", Arc::new(container.clone()), fx.spinner.clone())
            .settled()
            .await;

        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert_eq!(container.inner_html(), "");
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
        assert!(!fx.content.has_class(INVISIBLE_CLASS));
    }

    #[tokio::test]
    async fn test_spinner_stays_while_pending() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&format!("{}/hang/", base)).unwrap());
        let fx = fixture();
        let target = fx.page.get_element_by_id(RETURNS_GRAPH_ID).unwrap();
        let plotter = Arc::new(RecordingPlotter::default());

        let request =
            loader.display_portfolio_graph("", plotter.clone(), Arc::new(target), fx.spinner.clone());

        assert_eq!(request.state(), RequestState::Pending);
        assert_eq!(request.endpoint(), &Endpoint::ReturnsGraph);
        assert_eq!(fx.page.elements_by_class(SPINNER_CLASS).len(), 1);
        assert!(fx.content.has_class(INVISIBLE_CLASS));

        assert_eq!(request.settled().await, FetchOutcome::Applied);
        assert!(fx.page.elements_by_class(SPINNER_CLASS).is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_requests_last_settled_wins() {
        let base = serve().await;
        let loader = FragmentLoader::new(PortfolioHutClient::new(&base).unwrap());
        let fx = fixture();
        let container = fx.page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();

        // Started first, settles last
        let slow = loader.display_profile_returns(
            "alice",
            "?speed=slow",
            Arc::new(container.clone()),
            fx.spinner.clone(),
        );
        let fast = loader.display_profile_returns(
            "alice",
            "?speed=fast",
            Arc::new(container.clone()),
            fx.spinner.clone(),
        );

        assert_eq!(fast.settled().await, FetchOutcome::Applied);
        assert_eq!(container.inner_html(), "<table>fast</table>");

        assert_eq!(slow.settled().await, FetchOutcome::Applied);
        assert_eq!(container.inner_html(), "<table>slow</table>");
    }

    #[tokio::test]
    async fn test_fetch_and_apply_without_spawning() {
        let base = serve().await;
        let client = PortfolioHutClient::new(&base).unwrap();
        let fx = fixture();
        let container = fx.page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();
        let handler = ReplaceHtml::new(Arc::new(container.clone()));

        let outcome = fetch_and_apply(
            &client,
            &Endpoint::profile_returns("alice"),
            "",
            &handler,
            fx.spinner.as_ref(),
        )
        .await;

        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(container.inner_html(), "<table>all</table>");
    }
}
