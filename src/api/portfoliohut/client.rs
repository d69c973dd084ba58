use reqwest::Client as HttpClient;
use reqwest::Url;
use super::models::{ApiError, Endpoint, FragmentResponse};
use tracing::debug;

/// PortfolioHut HTTP client for fetching page fragments
pub struct PortfolioHutClient {
    http_client: HttpClient,
    base_url: Url,
}

impl PortfolioHutClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8000";

    /// Create a new client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{} cannot be a base URL", base_url)));
        }

        Ok(Self {
            http_client: HttpClient::new(),
            base_url,
        })
    }

    /// Build the request URL; `querystring` is appended verbatim (e.g. `?year=2021`)
    pub fn endpoint_url(&self, endpoint: &Endpoint, querystring: &str) -> Result<String, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(endpoint.segments());

        Ok(format!("{}{}", url, querystring))
    }

    /// GET an endpoint once. No retry and no timeout.
    ///
    /// # Returns
    /// * `Ok(FragmentResponse)` - The settled status; the body is read only for 200
    /// * `Err(ApiError)` - The request never produced a status
    pub async fn get(
        &self,
        endpoint: &Endpoint,
        querystring: &str,
    ) -> Result<FragmentResponse, ApiError> {
        let url = self.endpoint_url(endpoint, querystring)?;
        debug!("GET {}", url);

        let response = self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Ok(FragmentResponse {
                status,
                body: String::new(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::BodyError(format!("Failed to read response: {}", e)))?;

        Ok(FragmentResponse { status, body })
    }
}
