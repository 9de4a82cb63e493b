//! Settings types.
//!
//! All structs use `#[serde(default)]` so partial JSON files fill the gaps
//! from compiled defaults.

pub mod api;
pub mod connect;
pub mod popup;

pub use api::ApiSettings;
pub use connect::{ConnectSettings, ReentryPolicy};
pub use popup::PopupSettings;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TubelinkSettings {
    /// Backend REST API.
    pub api: ApiSettings,
    /// Credential storage.
    pub auth: AuthSettings,
    /// Connection flow timing and policy.
    pub connect: ConnectSettings,
    /// Authorization popup window.
    pub popup: PopupSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl TubelinkSettings {
    /// Reject values the connection flow cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue("api.baseUrl is empty".into()));
        }
        if self.auth.token_key.is_empty() {
            return Err(SettingsError::InvalidValue("auth.tokenKey is empty".into()));
        }
        if self.connect.poll_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "connect.pollIntervalMs must be > 0".into(),
            ));
        }
        if self.connect.popup_timeout_ms == Some(0) {
            return Err(SettingsError::InvalidValue(
                "connect.popupTimeoutMs must be > 0 when set".into(),
            ));
        }
        if self.popup.width == 0 || self.popup.height == 0 {
            return Err(SettingsError::InvalidValue(
                "popup width and height must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Credential storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// Key under which the bearer credential is stored.
    pub token_key: String,
    /// Override for the credentials file (defaults to `~/.tubelink/credentials.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_key: "token".to_string(),
            store_path: None,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TubelinkSettings::default()).unwrap();
        assert_eq!(json["auth"]["tokenKey"], "token");
        assert_eq!(json["connect"]["pollIntervalMs"], 1000);
        assert!(json["auth"].get("storePath").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TubelinkSettings =
            serde_json::from_str(r#"{"popup":{"width":800}}"#).unwrap();
        assert_eq!(settings.popup.width, 800);
        assert_eq!(settings.popup.height, 700);
        assert_eq!(settings.auth.token_key, "token");
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut settings = TubelinkSettings::default();
        settings.connect.poll_interval_ms = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("pollIntervalMs"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut settings = TubelinkSettings::default();
        settings.connect.popup_timeout_ms = Some(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_base_url() {
        let mut settings = TubelinkSettings::default();
        settings.api.base_url = "  ".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_popup() {
        let mut settings = TubelinkSettings::default();
        settings.popup.height = 0;
        assert!(settings.validate().is_err());
    }
}
