/// Server endpoints that return page fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `profile-returns/<username>`, answers with an HTML table fragment
    ProfileReturns { username: String },
    /// `returns-graph`, answers with a JSON figure
    ReturnsGraph,
}

impl Endpoint {
    pub fn profile_returns(username: impl Into<String>) -> Self {
        Endpoint::ProfileReturns {
            username: username.into(),
        }
    }

    /// Path segments relative to the site root
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::ProfileReturns { username } => vec!["profile-returns", username.as_str()],
            Endpoint::ReturnsGraph => vec!["returns-graph"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::ProfileReturns { .. } => "profile-returns",
            Endpoint::ReturnsGraph => "returns-graph",
        }
    }
}

/// A settled GET: status plus body (body is only read for 200)
#[derive(Debug, Clone)]
pub struct FragmentResponse {
    pub status: u16,
    pub body: String,
}

impl FragmentResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Comprehensive error type for API operations
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Base URL could not be parsed or cannot carry a path
    InvalidUrl(String),
    /// Network/request error
    RequestError(String),
    /// Body could not be read
    BodyError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ApiError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiError::BodyError(msg) => write!(f, "Body Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
