//! # tubelink-api
//!
//! The shared HTTP collaborator for the account-linking backend.
//!
//! [`ApiClient`] attaches the bearer credential, maps failures onto
//! [`ApiError`], removes the stored credential when the backend answers 401,
//! and tells the user about failures on endpoints that are user-initiated.
//! Callers depend on the [`BackendApi`] trait so the connection flow can run
//! against a fake backend.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;
use tubelink_auth::Credential;

pub use client::{ApiClient, ErrorReporting};
pub use errors::ApiError;
pub use types::{AuthUrlResponse, ConnectionStatusResponse, ConnectionStatusSnapshot};

/// Backend endpoints used by the connection flow.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Fetch the third-party authorization URL to open in the popup.
    async fn authorization_url(&self, credential: &Credential) -> Result<String, ApiError>;

    /// Fetch the backend's current view of linked accounts.
    async fn connection_status(
        &self,
        credential: &Credential,
    ) -> Result<ConnectionStatusSnapshot, ApiError>;
}
