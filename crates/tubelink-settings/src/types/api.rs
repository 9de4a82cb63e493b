//! Backend REST API settings.

use serde::{Deserialize, Serialize};

/// Where the backend lives and how to talk to it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Path of the authorization-URL endpoint.
    pub auth_url_path: String,
    /// Path of the connection-status endpoint.
    pub status_path: String,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// `User-Agent` header.
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            auth_url_path: "/youtube/auth-url".to_string(),
            status_path: "/youtube/connection-status".to_string(),
            request_timeout_ms: 30_000,
            user_agent: format!("tubelink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiSettings {
    /// Join the base URL and an endpoint path with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
