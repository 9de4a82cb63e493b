//! Wire payloads and the connection status snapshot.

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Body of the authorization-URL endpoint.
///
/// ```json
/// { "success": true, "authUrl": "https://accounts.google.com/o/oauth2/v2/auth?..." }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    /// Whether the backend produced a URL.
    pub success: bool,
    /// URL to open in the popup.
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Failure description.
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthUrlResponse {
    /// Extract the URL, treating `success: false` or a blank URL as failure.
    pub fn into_url(self) -> Result<String, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "Failed to get authorization URL".to_string()),
            ));
        }
        self.auth_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::Rejected("Authorization URL missing from response".to_string()))
    }
}

/// Body of the connection-status endpoint.
///
/// ```json
/// { "success": true, "connected": true, "channels": [{ "id": "UC..." }] }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    /// Whether the query itself succeeded.
    pub success: bool,
    /// Whether any account is linked.
    #[serde(default)]
    pub connected: bool,
    /// Linked channels; only the count matters here.
    #[serde(default)]
    pub channels: Vec<serde_json::Value>,
    /// Failure description.
    #[serde(default)]
    pub message: Option<String>,
}

impl ConnectionStatusResponse {
    /// Convert into a snapshot, treating `success: false` as failure.
    pub fn into_snapshot(self) -> Result<ConnectionStatusSnapshot, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "Failed to check connection status".to_string()),
            ));
        }
        Ok(ConnectionStatusSnapshot {
            connected: self.connected,
            account_count: self.channels.len(),
        })
    }
}

/// Point-in-time view of linked accounts. Replaced, never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusSnapshot {
    /// Backend's connected flag.
    pub connected: bool,
    /// Number of linked accounts.
    pub account_count: usize,
}

impl ConnectionStatusSnapshot {
    /// Connected with at least one account.
    pub fn has_linked_accounts(&self) -> bool {
        self.connected && self.account_count > 0
    }
}
