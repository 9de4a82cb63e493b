//! Connection flow errors.

use tubelink_api::ApiError;

/// Why [`initiate_connection`](crate::ConnectionFlow::initiate_connection)
/// did not leave a popup open.
///
/// Every variant leaves the flow idle. User notification has already
/// happened where one is due.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// No credential stored; the user was asked to sign in.
    #[error("not signed in")]
    CredentialMissing,

    /// The authorization-URL request failed; the HTTP client reported it.
    #[error("authorization URL request failed: {0}")]
    AuthUrlRequestFailed(#[source] ApiError),

    /// The popup provider refused to open a window; the user was told.
    #[error("authorization popup was blocked")]
    PopupBlocked,

    /// Another handshake is in progress and the policy is to reject.
    #[error("a connection attempt is already in progress")]
    SessionActive,

    /// The session was aborted or superseded before its popup opened.
    #[error("connection attempt was cancelled")]
    Cancelled,
}
