//! The bearer credential.

use secrecy::{ExposeSecret, SecretString};

use crate::storage::TokenStore;

/// Opaque bearer token (zeroized on drop, redacted in `Debug`).
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Read the credential stored under `key`.
    ///
    /// Missing and blank values both count as "not signed in".
    pub fn load(store: &dyn TokenStore, key: &str) -> Option<Self> {
        store
            .read(key)
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    /// The raw token, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;

    #[test]
    fn debug_is_redacted() {
        let cred = Credential::new("super-secret");
        let out = format!("{cred:?}");
        assert!(!out.contains("super-secret"));
        assert!(out.contains("REDACTED"));
    }

    #[test]
    fn load_missing_is_none() {
        let store = MemoryTokenStore::new();
        assert!(Credential::load(&store, "token").is_none());
    }

    #[test]
    fn load_blank_is_none() {
        let store = MemoryTokenStore::new();
        store.write("token", "   ").unwrap();
        assert!(Credential::load(&store, "token").is_none());
    }

    #[test]
    fn load_reads_the_named_key() {
        let store = MemoryTokenStore::new();
        store.write("token", "a").unwrap();
        store.write("other", "b").unwrap();
        assert_eq!(Credential::load(&store, "other").unwrap().expose(), "b");
    }
}
