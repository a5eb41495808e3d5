use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_MOCK_COUNT: usize = 5;

pub const PATH_HEALTH: &str = "/api/health";
pub const PATH_CONFIG: &str = "/api/config";
pub const PATH_SETTINGS: &str = "/api/settings";
pub const PATH_MOCK_PURCHASE: &str = "/api/mock-purchase";
pub const PATH_MOCK_PURCHASES: &str = "/api/mock-purchases";

/// Base URL of a local server. `PROOFD_URL` overrides.
pub fn default_server_url() -> String {
    std::env::var("PROOFD_URL").unwrap_or_else(|_| format!("http://localhost:{DEFAULT_PORT}"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Parse the `:count` segment of a mock batch request. Anything unparsable or
/// zero falls back to the default batch size.
pub fn parse_mock_count(segment: &str) -> usize {
    match segment.trim().parse::<usize>() {
        Ok(0) | Err(_) => DEFAULT_MOCK_COUNT,
        Ok(n) => n,
    }
}
