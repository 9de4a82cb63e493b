//! The connection flow orchestrator.
//!
//! [`ConnectionFlow::initiate_connection`] runs the handshake up to the point
//! where the popup is open, then hands the popup to a spawned poll task. The
//! poll task owns the popup handle and its interval timer for the rest of
//! the session; when it sees the popup closed it drops the timer, clears the
//! connecting flag, and reconciles with the backend.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};
use tubelink_api::{BackendApi, ConnectionStatusSnapshot};
use tubelink_auth::{Credential, TokenStore};
use tubelink_core::Notifier;
use tubelink_settings::{ReentryPolicy, TubelinkSettings};

use crate::errors::ConnectError;
use crate::popup::{PopupGeometry, PopupHandle, PopupProvider};
use crate::state::{ConnectionPhase, SessionId, SessionState};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Floor for the poll period; a zero period would never tick.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// User-facing notification texts.
pub mod messages {
    /// No credential stored at initiation.
    pub const SIGN_IN_FIRST: &str = "Please sign in first to connect a YouTube channel.";
    /// The popup provider refused to open a window.
    pub const POPUP_BLOCKED: &str =
        "Popup blocked. Please allow popups for this site and try again.";
    /// Reconciliation found nothing linked.
    pub const NOTHING_CONNECTED: &str = "No YouTube channels were connected.";
    /// The popup stayed open past the configured timeout.
    pub const POPUP_TIMED_OUT: &str =
        "The YouTube sign-in window was open too long and has been closed. Please try again.";

    /// Success text for `count` newly visible accounts.
    pub fn linked(count: usize) -> String {
        let plural = if count == 1 { "" } else { "s" };
        format!("Successfully connected {count} YouTube channel{plural}!")
    }
}

/// Published on the event channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Linked accounts changed; anything showing them should re-fetch.
    AccountsChanged {
        /// Accounts the backend reported after the handshake.
        account_count: usize,
    },
}

/// Timing, naming and policy for a [`ConnectionFlow`].
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Token store key of the bearer credential.
    pub token_key: String,
    /// Popup window name.
    pub popup_name: String,
    /// Popup window geometry.
    pub geometry: PopupGeometry,
    /// Interval between popup liveness checks. Clamped to at least 1 ms.
    pub poll_interval: Duration,
    /// Delay between a successful link and [`ConnectionEvent::AccountsChanged`].
    pub refresh_delay: Duration,
    /// Force-abort a popup left open this long. `None` waits forever.
    pub popup_timeout: Option<Duration>,
    /// What a second initiation does while a session is active.
    pub reentry: ReentryPolicy,
}

impl FlowConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &TubelinkSettings) -> Self {
        Self {
            token_key: settings.auth.token_key.clone(),
            popup_name: settings.popup.name.clone(),
            geometry: PopupGeometry::from(&settings.popup),
            poll_interval: settings.connect.poll_interval(),
            refresh_delay: settings.connect.refresh_delay(),
            popup_timeout: settings.connect.popup_timeout(),
            reentry: settings.connect.reentry,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::from_settings(&TubelinkSettings::default())
    }
}

/// Orchestrates the account-linking handshake.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct ConnectionFlow {
    inner: Arc<Inner>,
}

struct Inner {
    config: FlowConfig,
    backend: Arc<dyn BackendApi>,
    tokens: Arc<dyn TokenStore>,
    popups: Arc<dyn PopupProvider>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
    phase: watch::Sender<ConnectionPhase>,
    events: broadcast::Sender<ConnectionEvent>,
    next_session: AtomicU64,
}

/// Returns its session to idle when dropped.
///
/// Created when a session is claimed and moved into the poll task once the
/// popup is open, so the session is released on every exit: early returns,
/// a dropped `initiate_connection` future, or a panicking poll task.
struct SessionGuard {
    inner: Arc<Inner>,
    id: SessionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.inner.finish(self.id) {
            debug!(session_id = self.id, "session released");
        }
    }
}

/// Spawn a background task, logging it if it panics.
fn spawn_logged<F>(task: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(fut);
    let _ = tokio::spawn(async move {
        match handle.await {
            Err(e) if e.is_panic() => error!(task, "background task panicked: {e}"),
            _ => {}
        }
    });
}

/// Why a poll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollExit {
    Closed,
    TimedOut,
    Cancelled,
}

impl ConnectionFlow {
    /// Create an idle flow.
    pub fn new(
        config: FlowConfig,
        backend: Arc<dyn BackendApi>,
        tokens: Arc<dyn TokenStore>,
        popups: Arc<dyn PopupProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (phase, _) = watch::channel(ConnectionPhase::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                backend,
                tokens,
                popups,
                notifier,
                state: Mutex::new(SessionState::Idle),
                phase,
                events,
                next_session: AtomicU64::new(0),
            }),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ConnectionPhase {
        *self.inner.phase.borrow()
    }

    /// Whether a handshake is in progress (the UI's connecting flag).
    pub fn is_connecting(&self) -> bool {
        self.phase().is_connecting()
    }

    /// Watch phase transitions.
    pub fn watch_phase(&self) -> watch::Receiver<ConnectionPhase> {
        self.inner.phase.subscribe()
    }

    /// Subscribe to [`ConnectionEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    /// Resolve once the flow is idle again.
    pub async fn wait_idle(&self) {
        let mut rx = self.watch_phase();
        let _ = rx.wait_for(|p| *p == ConnectionPhase::Idle).await;
    }

    /// Start a handshake.
    ///
    /// Returns once the popup is open and being polled, or once the attempt
    /// has failed. On `Ok` the rest of the session runs in the background;
    /// use [`watch_phase`](Self::watch_phase) or [`wait_idle`](Self::wait_idle)
    /// to follow it.
    #[instrument(skip(self), fields(session_id = tracing::field::Empty))]
    pub async fn initiate_connection(&self) -> Result<(), ConnectError> {
        let inner = &self.inner;
        let id = inner.begin()?;
        let _ = tracing::Span::current().record("session_id", id);
        let guard = SessionGuard {
            inner: Arc::clone(inner),
            id,
        };

        let Some(credential) = Credential::load(inner.tokens.as_ref(), &inner.config.token_key)
        else {
            info!("connection attempted without a credential");
            inner.notifier.error(messages::SIGN_IN_FIRST);
            return Err(ConnectError::CredentialMissing);
        };

        let url = match inner.backend.authorization_url(&credential).await {
            Ok(url) => url,
            Err(e) => {
                // the HTTP client already told the user
                warn!(error = %e, "authorization URL request failed");
                return Err(ConnectError::AuthUrlRequestFailed(e));
            }
        };

        if !inner.is_requesting(id) {
            debug!("session replaced while the URL request was in flight");
            return Err(ConnectError::Cancelled);
        }

        let Some(mut popup) =
            inner
                .popups
                .open(&url, &inner.config.popup_name, &inner.config.geometry)
        else {
            warn!("authorization popup blocked");
            inner.notifier.error(messages::POPUP_BLOCKED);
            return Err(ConnectError::PopupBlocked);
        };

        if !inner.mark_popup_open(id) {
            popup.close();
            return Err(ConnectError::Cancelled);
        }

        let cancel = CancellationToken::new();
        if !inner.start_polling(id, cancel.clone()) {
            popup.close();
            return Err(ConnectError::Cancelled);
        }

        info!("authorization popup open, polling for closure");
        spawn_logged("popup poll", poll_popup(guard, popup, cancel));
        Ok(())
    }

    /// Query the backend and announce the outcome.
    ///
    /// Runs automatically after the popup closes; callable on its own to
    /// re-check. Failures are logged, never shown to the user.
    pub async fn reconcile_status(&self) -> Option<ConnectionStatusSnapshot> {
        self.inner.reconcile().await
    }

    /// Abort the active handshake, closing its popup.
    ///
    /// Returns `false` if there was nothing to abort. Reconciliation that
    /// has already started is not interrupted.
    #[instrument(skip(self))]
    pub fn abort(&self) -> bool {
        let mut state = self.inner.state.lock();
        if !state.is_active() {
            return false;
        }
        info!(session_id = ?state.id(), "aborting connection attempt");
        state.cancel_poll();
        self.inner.set(&mut state, SessionState::Idle);
        true
    }
}

impl Inner {
    /// Replace the state and publish the new phase. Call with the lock held.
    fn set(&self, slot: &mut SessionState, next: SessionState) {
        trace!(from = %slot.phase(), to = %next.phase(), "session transition");
        *slot = next;
        let _ = self.phase.send_replace(slot.phase());
    }

    /// Claim the flow for a new session, applying the re-entry policy.
    fn begin(&self) -> Result<SessionId, ConnectError> {
        let mut state = self.state.lock();
        if state.is_active() {
            match self.config.reentry {
                ReentryPolicy::Reject => {
                    warn!(active = ?state.id(), "connection already in progress, rejecting");
                    return Err(ConnectError::SessionActive);
                }
                ReentryPolicy::Supersede => {
                    info!(active = ?state.id(), "superseding active connection attempt");
                    state.cancel_poll();
                }
            }
        }
        let id = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        self.set(&mut state, SessionState::RequestingUrl { id });
        Ok(id)
    }

    fn is_requesting(&self, id: SessionId) -> bool {
        matches!(*self.state.lock(), SessionState::RequestingUrl { id: current } if current == id)
    }

    fn mark_popup_open(&self, id: SessionId) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, SessionState::RequestingUrl { id: current } if current == id) {
            return false;
        }
        self.set(&mut state, SessionState::PopupOpen { id });
        true
    }

    fn start_polling(&self, id: SessionId, cancel: CancellationToken) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, SessionState::PopupOpen { id: current } if current == id) {
            return false;
        }
        self.set(&mut state, SessionState::Polling { id, cancel });
        true
    }

    fn enter_reconcile(&self, id: SessionId) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, SessionState::Polling { id: current, .. } if current == id) {
            return false;
        }
        self.set(&mut state, SessionState::Reconciling { id });
        true
    }

    /// Return to idle if `id` is still the current session.
    fn finish(&self, id: SessionId) -> bool {
        let mut state = self.state.lock();
        if state.id() != Some(id) {
            return false;
        }
        self.set(&mut state, SessionState::Idle);
        true
    }

    async fn reconcile(&self) -> Option<ConnectionStatusSnapshot> {
        let Some(credential) = Credential::load(self.tokens.as_ref(), &self.config.token_key)
        else {
            debug!("credential gone before status check, skipping");
            return None;
        };

        let snapshot = match self.backend.connection_status(&credential).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "connection status check failed");
                return None;
            }
        };

        if snapshot.has_linked_accounts() {
            info!(accounts = snapshot.account_count, "accounts linked");
            self.notifier.success(&messages::linked(snapshot.account_count));
            self.schedule_refresh(snapshot.account_count);
        } else if !snapshot.connected {
            self.notifier.info(messages::NOTHING_CONNECTED);
        } else {
            debug!("backend reports connected with no accounts");
        }
        Some(snapshot)
    }

    /// Publish [`ConnectionEvent::AccountsChanged`] after the refresh delay.
    fn schedule_refresh(&self, account_count: usize) {
        let events = self.events.clone();
        let delay = self.config.refresh_delay;
        spawn_logged("accounts refresh", async move {
            tokio::time::sleep(delay).await;
            debug!(account_count, "publishing accounts-changed refresh");
            // no subscribers is fine
            let _ = events.send(ConnectionEvent::AccountsChanged { account_count });
        });
    }
}

/// Poll loop for one session. Owns the popup, the interval timer and the
/// session guard.
#[instrument(skip_all, fields(session_id = session.id))]
async fn poll_popup(
    session: SessionGuard,
    mut popup: Box<dyn PopupHandle>,
    cancel: CancellationToken,
) {
    let inner = &session.inner;
    let id = session.id;
    let period = inner.config.poll_interval.max(MIN_POLL_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = inner.config.popup_timeout.map(|t| Instant::now() + t);
    let timeout = async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(timeout);

    let mut checks: u64 = 0;
    let exit = loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break PollExit::Cancelled,
            () = &mut timeout => break PollExit::TimedOut,
            _ = ticker.tick() => {
                checks += 1;
                if popup.is_closed() {
                    break PollExit::Closed;
                }
                trace!(checks, "popup still open");
            }
        }
    };
    drop(ticker);
    debug!(?exit, checks, "poll loop finished");

    match exit {
        PollExit::Cancelled => popup.close(),
        PollExit::TimedOut => {
            popup.close();
            if inner.finish(id) {
                warn!("popup left open past timeout, session aborted");
                inner.notifier.info(messages::POPUP_TIMED_OUT);
            }
        }
        PollExit::Closed => {
            drop(popup);
            if inner.enter_reconcile(id) {
                let _ = inner.reconcile().await;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
