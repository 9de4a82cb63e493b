//! # tubelink-connect
//!
//! Drives the YouTube account-linking handshake:
//!
//! 1. Ask the backend for an authorization URL
//! 2. Open it in a popup window
//! 3. Poll until the user closes the popup
//! 4. Ask the backend what got linked and tell the rest of the app
//!
//! [`ConnectionFlow`] owns at most one session at a time. Its phase is
//! observable through a `watch` channel and successful links are announced
//! on a broadcast channel as [`ConnectionEvent::AccountsChanged`].
//!
//! Collaborators are injected: [`tubelink_api::BackendApi`],
//! [`tubelink_auth::TokenStore`], [`tubelink_core::Notifier`] and
//! [`PopupProvider`].

#![deny(unsafe_code)]

pub mod errors;
pub mod flow;
pub mod popup;
pub mod state;

#[cfg(test)]
mod testing;

pub use errors::ConnectError;
pub use flow::{ConnectionEvent, ConnectionFlow, FlowConfig, messages};
pub use popup::browser::BrowserPopupProvider;
pub use popup::{PopupGeometry, PopupHandle, PopupProvider};
pub use state::{ConnectionPhase, SessionId};
