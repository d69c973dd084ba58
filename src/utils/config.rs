use crate::api::portfoliohut::PortfolioHutClient;
use crate::services::chart_service::DEFAULT_RETURNS_CSV;

const DEFAULT_CHART_WIDTH: u32 = 1024;
const DEFAULT_CHART_HEIGHT: u32 = 576;

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub returns_csv_path: String,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys use defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            base_url: get("PORTFOLIOHUT_BASE_URL")
                .unwrap_or_else(|| PortfolioHutClient::DEFAULT_BASE_URL.to_string()),
            returns_csv_path: get("RETURNS_CSV_PATH")
                .unwrap_or_else(|| DEFAULT_RETURNS_CSV.to_string()),
            chart_width: parse_dimension("CHART_WIDTH", get("CHART_WIDTH"), DEFAULT_CHART_WIDTH)?,
            chart_height: parse_dimension("CHART_HEIGHT", get("CHART_HEIGHT"), DEFAULT_CHART_HEIGHT)?,
        })
    }
}

fn parse_dimension(key: &str, value: Option<String>, default: u32) -> Result<u32, String> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(format!("❌ {} must be a positive integer, got '{}'", key, raw)),
            Ok(n) => Ok(n),
        },
    }
}
