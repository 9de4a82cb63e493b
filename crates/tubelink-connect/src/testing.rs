//! In-memory collaborators for flow tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tubelink_api::{ApiError, BackendApi, ConnectionStatusSnapshot};
use tubelink_auth::Credential;

use crate::popup::{PopupGeometry, PopupHandle, PopupProvider};

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Scripted backend that counts calls.
pub(crate) struct FakeBackend {
    auth_url: Mutex<Option<String>>,
    status: Mutex<Option<ConnectionStatusSnapshot>>,
    /// When set, the auth-URL call parks until notified.
    auth_gate: Option<Arc<Notify>>,
    pub(crate) auth_calls: AtomicUsize,
    pub(crate) status_calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            auth_url: Mutex::new(Some("https://accounts.example/o/oauth2/auth?state=s1".into())),
            status: Mutex::new(Some(ConnectionStatusSnapshot {
                connected: true,
                account_count: 1,
            })),
            auth_gate: None,
            auth_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.auth_gate = Some(gate);
        self
    }

    pub(crate) fn fail_auth_url(&self) {
        *self.auth_url.lock() = None;
    }

    pub(crate) fn set_status(&self, connected: bool, account_count: usize) {
        *self.status.lock() = Some(ConnectionStatusSnapshot {
            connected,
            account_count,
        });
    }

    pub(crate) fn fail_status(&self) {
        *self.status.lock() = None;
    }

    pub(crate) fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn authorization_url(&self, _credential: &Credential) -> Result<String, ApiError> {
        let _ = self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.auth_gate {
            gate.notified().await;
        }
        self.auth_url
            .lock()
            .clone()
            .ok_or_else(|| ApiError::Rejected("auth url unavailable".into()))
    }

    async fn connection_status(
        &self,
        _credential: &Credential,
    ) -> Result<ConnectionStatusSnapshot, ApiError> {
        let _ = self.status_calls.fetch_add(1, Ordering::SeqCst);
        (*self.status.lock()).ok_or_else(|| ApiError::Status {
            status: 502,
            message: "bad gateway".into(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Popups
// ─────────────────────────────────────────────────────────────────────────────

/// Shared view of one fake popup window.
#[derive(Clone, Default)]
pub(crate) struct FakeWindow {
    closed: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
    checks: Arc<AtomicUsize>,
    close_calls: Arc<AtomicUsize>,
}

impl FakeWindow {
    /// Simulate the user closing the window.
    pub(crate) fn user_closes(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Make the next liveness check panic.
    pub(crate) fn break_on_check(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of liveness checks made by the poll loop.
    pub(crate) fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    /// Number of times the flow closed the window itself.
    pub(crate) fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

struct FakeHandle(FakeWindow);

impl PopupHandle for FakeHandle {
    fn is_closed(&mut self) -> bool {
        let _ = self.0.checks.fetch_add(1, Ordering::SeqCst);
        assert!(!self.0.broken.load(Ordering::SeqCst), "window handle went away");
        self.0.is_closed()
    }

    fn close(&mut self) {
        let _ = self.0.close_calls.fetch_add(1, Ordering::SeqCst);
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

/// One recorded `open` call.
#[derive(Clone)]
pub(crate) struct OpenedPopup {
    pub(crate) url: String,
    pub(crate) name: String,
    pub(crate) geometry: PopupGeometry,
    pub(crate) window: FakeWindow,
}

/// Popup provider that records every window it opens.
#[derive(Default)]
pub(crate) struct FakePopups {
    blocked: AtomicBool,
    opened: Mutex<Vec<OpenedPopup>>,
}

impl FakePopups {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn block(&self) {
        self.blocked.store(true, Ordering::SeqCst);
    }

    pub(crate) fn opened(&self) -> Vec<OpenedPopup> {
        self.opened.lock().clone()
    }

    pub(crate) fn last(&self) -> FakeWindow {
        self.opened
            .lock()
            .last()
            .map(|p| p.window.clone())
            .expect("no popup opened")
    }
}

impl PopupProvider for FakePopups {
    fn open(
        &self,
        url: &str,
        name: &str,
        geometry: &PopupGeometry,
    ) -> Option<Box<dyn PopupHandle>> {
        if self.blocked.load(Ordering::SeqCst) {
            return None;
        }
        let window = FakeWindow::default();
        self.opened.lock().push(OpenedPopup {
            url: url.to_string(),
            name: name.to_string(),
            geometry: *geometry,
            window: window.clone(),
        });
        Some(Box::new(FakeHandle(window)))
    }
}
