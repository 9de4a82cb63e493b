//! # tubelink-auth
//!
//! Persistent key-value storage for the dashboard's bearer credential.
//!
//! The login flow writes the credential, the connection flow and the HTTP
//! client read it, and the HTTP client removes it when the backend answers
//! 401. Nothing here validates the token; it is opaque.
//!
//! - [`TokenStore`]: the storage seam
//! - [`FileTokenStore`]: `~/.tubelink/credentials.json` with 0o600 permissions
//! - [`MemoryTokenStore`]: process-local store for tests and embedding
//! - [`Credential`]: the secret-wrapped bearer token

#![deny(unsafe_code)]

pub mod credential;
pub mod errors;
pub mod storage;

pub use credential::Credential;
pub use errors::AuthError;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, credentials_file_path};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
