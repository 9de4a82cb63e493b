//! Session state machine.
//!
//! ```text
//! Idle ─▶ RequestingUrl ─▶ PopupOpen ─▶ Polling ─▶ Reconciling ─▶ Idle
//!              │                           │
//!              └──▶ Idle (no credential,   └──▶ Idle (abort, timeout)
//!                   request failed,
//!                   popup blocked)
//! ```
//!
//! The popup handle itself never lives here: the poll task owns it. The
//! `Polling` variant keeps the token that stops that task.

use tokio_util::sync::CancellationToken;

/// Identifies one handshake attempt within a [`ConnectionFlow`](crate::ConnectionFlow).
pub type SessionId = u64;

/// Observable phase of the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    /// No handshake in progress.
    Idle,
    /// Waiting for the backend's authorization URL.
    RequestingUrl,
    /// Popup opened, poll loop not started yet.
    PopupOpen,
    /// Waiting for the user to close the popup.
    Polling,
    /// Popup closed; querying the backend for the outcome.
    Reconciling,
}

impl ConnectionPhase {
    /// The UI's "connecting" flag: true from initiation until the popup closes.
    pub fn is_connecting(self) -> bool {
        matches!(self, Self::RequestingUrl | Self::PopupOpen | Self::Polling)
    }
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::RequestingUrl => "requesting-url",
            Self::PopupOpen => "popup-open",
            Self::Polling => "polling",
            Self::Reconciling => "reconciling",
        };
        f.write_str(s)
    }
}

/// Internal session state, one variant per phase.
#[derive(Debug)]
pub(crate) enum SessionState {
    Idle,
    RequestingUrl { id: SessionId },
    PopupOpen { id: SessionId },
    Polling { id: SessionId, cancel: CancellationToken },
    Reconciling { id: SessionId },
}

impl SessionState {
    pub(crate) fn phase(&self) -> ConnectionPhase {
        match self {
            Self::Idle => ConnectionPhase::Idle,
            Self::RequestingUrl { .. } => ConnectionPhase::RequestingUrl,
            Self::PopupOpen { .. } => ConnectionPhase::PopupOpen,
            Self::Polling { .. } => ConnectionPhase::Polling,
            Self::Reconciling { .. } => ConnectionPhase::Reconciling,
        }
    }

    pub(crate) fn id(&self) -> Option<SessionId> {
        match self {
            Self::Idle => None,
            Self::RequestingUrl { id }
            | Self::PopupOpen { id }
            | Self::Polling { id, .. }
            | Self::Reconciling { id } => Some(*id),
        }
    }

    /// Whether a handshake is holding the flow (reconciliation does not).
    pub(crate) fn is_active(&self) -> bool {
        self.phase().is_connecting()
    }

    /// Stop the poll task, if one is running.
    pub(crate) fn cancel_poll(&self) {
        if let Self::Polling { cancel, .. } = self {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connecting_phases() {
        assert!(!ConnectionPhase::Idle.is_connecting());
        assert!(ConnectionPhase::RequestingUrl.is_connecting());
        assert!(ConnectionPhase::PopupOpen.is_connecting());
        assert!(ConnectionPhase::Polling.is_connecting());
        assert!(!ConnectionPhase::Reconciling.is_connecting());
    }

    #[test]
    fn state_ids() {
        assert_eq!(SessionState::Idle.id(), None);
        assert_eq!(SessionState::RequestingUrl { id: 3 }.id(), Some(3));
        let polling = SessionState::Polling {
            id: 4,
            cancel: CancellationToken::new(),
        };
        assert_eq!(polling.id(), Some(4));
        assert_eq!(polling.phase(), ConnectionPhase::Polling);
        assert!(polling.is_active());
        assert!(!SessionState::Reconciling { id: 5 }.is_active());
    }

    #[test]
    fn cancel_poll_trips_token() {
        let cancel = CancellationToken::new();
        let state = SessionState::Polling {
            id: 1,
            cancel: cancel.clone(),
        };
        state.cancel_poll();
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn phase_display() {
        assert_eq!(ConnectionPhase::RequestingUrl.to_string(), "requesting-url");
        assert_eq!(ConnectionPhase::Idle.to_string(), "idle");
    }
}
