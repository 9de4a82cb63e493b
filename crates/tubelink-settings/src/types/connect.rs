//! Connection flow settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens when a handshake is started while another is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReentryPolicy {
    /// Refuse the new attempt and leave the active one alone.
    #[default]
    Reject,
    /// Cancel the active attempt (closing its popup) and start over.
    Supersede,
}

/// Timing and policy for the connection flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectSettings {
    /// Interval between popup liveness checks.
    pub poll_interval_ms: u64,
    /// Delay between a successful link and the refresh signal.
    pub refresh_delay_ms: u64,
    /// Give up on a popup left open this long. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup_timeout_ms: Option<u64>,
    /// Re-entrant initiation policy.
    pub reentry: ReentryPolicy,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            refresh_delay_ms: 1000,
            popup_timeout_ms: None,
            reentry: ReentryPolicy::Reject,
        }
    }
}

impl ConnectSettings {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Refresh delay as a [`Duration`].
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    /// Popup timeout as a [`Duration`], if configured.
    pub fn popup_timeout(&self) -> Option<Duration> {
        self.popup_timeout_ms.map(Duration::from_millis)
    }
}
