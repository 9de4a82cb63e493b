//! API error types.

/// Errors returned by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure, timeout, or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credential.
    #[error("credential rejected by backend (401)")]
    Unauthorized,

    /// Non-success HTTP status.
    #[error("backend error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error description extracted from the body.
        message: String,
    },

    /// The backend answered 2xx with `success: false` or an incomplete payload.
    #[error("backend reported failure: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => "The server took too long to respond.".to_string(),
            Self::Http(e) if e.is_decode() => "Unexpected response from the server.".to_string(),
            Self::Http(_) => "Could not reach the server. Check your connection.".to_string(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Status { status, message } if message.is_empty() => {
                format!("Request failed ({status}).")
            }
            Self::Status { message, .. } | Self::Rejected(message) => message.clone(),
        }
    }

    /// Whether this error means the stored credential is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
