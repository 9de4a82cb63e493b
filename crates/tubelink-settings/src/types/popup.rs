//! Authorization popup window settings.

use serde::{Deserialize, Serialize};

/// Name and geometry of the authorization window.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopupSettings {
    /// Window name; also names the isolated browser profile.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Horizontal screen offset.
    pub left: i32,
    /// Vertical screen offset.
    pub top: i32,
    /// Browser executable override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_path: Option<String>,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            name: "youtube-oauth".to_string(),
            width: 600,
            height: 700,
            left: 200,
            top: 100,
            browser_path: None,
        }
    }
}
