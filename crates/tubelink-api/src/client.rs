//! `reqwest`-backed [`BackendApi`] implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tubelink_auth::{Credential, TokenStore};
use tubelink_core::Notifier;
use tubelink_settings::ApiSettings;

use crate::BackendApi;
use crate::errors::ApiError;
use crate::types::{AuthUrlResponse, ConnectionStatusResponse, ConnectionStatusSnapshot};

/// How a failed request is surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorReporting {
    /// Tell the user through the notifier.
    Notify,
    /// Log only.
    Silent,
}

/// HTTP client for the account-linking endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    settings: ApiSettings,
    tokens: Arc<dyn TokenStore>,
    token_key: String,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    /// Build a client.
    ///
    /// `tokens` and `token_key` locate the credential to drop on 401.
    pub fn new(
        settings: ApiSettings,
        tokens: Arc<dyn TokenStore>,
        token_key: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            settings,
            tokens,
            token_key: token_key.into(),
            notifier,
        })
    }

    /// GET `path` with the bearer credential and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<T, ApiError> {
        let url = self.settings.endpoint(path);
        tracing::debug!(%url, "backend request");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(credential.expose())
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(resp.json::<T>().await?)
    }

    /// Apply the shared failure policy to a finished call.
    ///
    /// 401 always drops the stored credential; the user hears about the
    /// failure only under [`ErrorReporting::Notify`].
    fn report<T>(
        &self,
        result: Result<T, ApiError>,
        reporting: ErrorReporting,
    ) -> Result<T, ApiError> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if err.is_unauthorized() {
            tracing::warn!("backend rejected credential, removing it");
            if let Err(e) = self.tokens.remove(&self.token_key) {
                tracing::warn!("failed to remove rejected credential: {e}");
            }
        }

        match reporting {
            ErrorReporting::Notify => {
                tracing::warn!(error = %err, "backend request failed");
                self.notifier.error(&err.user_message());
            }
            ErrorReporting::Silent => {
                tracing::warn!(error = %err, "backend request failed (not reported)");
            }
        }
        Err(err)
    }
}

#[async_trait]
impl BackendApi for ApiClient {
    #[tracing::instrument(skip_all)]
    async fn authorization_url(&self, credential: &Credential) -> Result<String, ApiError> {
        let result = self
            .get_json::<AuthUrlResponse>(&self.settings.auth_url_path, credential)
            .await
            .and_then(AuthUrlResponse::into_url);
        self.report(result, ErrorReporting::Notify)
    }

    #[tracing::instrument(skip_all)]
    async fn connection_status(
        &self,
        credential: &Credential,
    ) -> Result<ConnectionStatusSnapshot, ApiError> {
        let result = self
            .get_json::<ConnectionStatusResponse>(&self.settings.status_path, credential)
            .await
            .and_then(ConnectionStatusResponse::into_snapshot);
        self.report(result, ErrorReporting::Silent)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers a JSON `message` (or `error`) string field, else the trimmed text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = value.get(field).and_then(serde_json::Value::as_str) {
                return msg.to_string();
            }
        }
    }
    body.trim().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tubelink_auth::MemoryTokenStore;
    use tubelink_core::{NoticeLevel, RecordingNotifier};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        client: ApiClient,
        tokens: Arc<MemoryTokenStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(server: &MockServer) -> Harness {
        let tokens = Arc::new(MemoryTokenStore::with_entry("token", "tok-1"));
        let notifier = Arc::new(RecordingNotifier::new());
        let settings = ApiSettings {
            base_url: format!("{}/api", server.uri()),
            request_timeout_ms: 5_000,
            ..Default::default()
        };
        let client = ApiClient::new(settings, tokens.clone(), "token", notifier.clone()).unwrap();
        Harness {
            client,
            tokens,
            notifier,
        }
    }

    fn cred() -> Credential {
        Credential::new("tok-1")
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message":"nope"}"#), "nope");
        assert_eq!(error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(error_message("  plain text \n"), "plain text");
        assert_eq!(error_message(r#"{"code":1}"#), r#"{"code":1}"#);
    }

    #[tokio::test]
    async fn authorization_url_sends_bearer_and_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/auth-url"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "authUrl": "https://accounts.example/oauth?x=1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        let url = h.client.authorization_url(&cred()).await.unwrap();
        assert_eq!(url, "https://accounts.example/oauth?x=1");
        assert!(h.notifier.is_empty());
    }

    #[tokio::test]
    async fn authorization_url_failure_notifies_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/auth-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "message": "OAuth client not configured"
            })))
            .mount(&server)
            .await;

        let h = harness(&server);
        let err = h.client.authorization_url(&cred()).await.unwrap_err();
        assert_matches!(err, ApiError::Rejected(_));

        let errors = h.notifier.notices_at(NoticeLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "OAuth client not configured");
    }

    #[tokio::test]
    async fn server_error_maps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/auth-url"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"message": "db down"})),
            )
            .mount(&server)
            .await;

        let h = harness(&server);
        let err = h.client.authorization_url(&cred()).await.unwrap_err();
        assert_matches!(err, ApiError::Status { status: 500, ref message } if message == "db down");
        assert_eq!(h.notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_removes_credential_and_notifies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/auth-url"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let h = harness(&server);
        let err = h.client.authorization_url(&cred()).await.unwrap_err();
        assert_matches!(err, ApiError::Unauthorized);
        assert!(h.tokens.read("token").is_none());

        let errors = h.notifier.notices_at(NoticeLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("sign in"));
    }

    #[tokio::test]
    async fn connection_status_returns_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/connection-status"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "connected": true,
                "channels": [{"id": "UC1"}, {"id": "UC2"}, {"id": "UC3"}]
            })))
            .mount(&server)
            .await;

        let h = harness(&server);
        let snap = h.client.connection_status(&cred()).await.unwrap();
        assert!(snap.connected);
        assert_eq!(snap.account_count, 3);
    }

    #[tokio::test]
    async fn connection_status_failure_is_silent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/connection-status"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let h = harness(&server);
        let err = h.client.connection_status(&cred()).await.unwrap_err();
        assert_matches!(err, ApiError::Status { status: 503, .. });
        assert!(h.notifier.is_empty());
        assert!(h.tokens.read("token").is_some());
    }

    #[tokio::test]
    async fn connection_status_unauthorized_still_drops_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/connection-status"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let h = harness(&server);
        let _ = h.client.connection_status(&cred()).await.unwrap_err();
        assert!(h.tokens.read("token").is_none());
        assert!(h.notifier.is_empty());
    }

    #[tokio::test]
    async fn undecodable_body_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/youtube/auth-url"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let h = harness(&server);
        let err = h.client.authorization_url(&cred()).await.unwrap_err();
        assert_matches!(err, ApiError::Http(ref e) if e.is_decode());
        assert_eq!(
            h.notifier.notices()[0].message,
            "Unexpected response from the server."
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        let server = MockServer::start().await;
        let h = harness(&server);
        drop(server);

        let err = h.client.connection_status(&cred()).await.unwrap_err();
        assert_matches!(err, ApiError::Http(_));
    }
}
