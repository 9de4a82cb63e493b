//! Token storage.
//!
//! [`FileTokenStore`] reads and writes `~/.tubelink/credentials.json` with
//! secure file permissions (0o600). Every call goes to disk so a credential
//! written or removed by another process is seen on the next read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// Default credentials file name.
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Current on-disk format version.
const STORAGE_VERSION: u32 = 1;

/// Get the credentials file path under the given data directory.
pub fn credentials_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CREDENTIALS_FILE_NAME)
}

/// Persistent key-value store for credentials.
pub trait TokenStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn read(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), AuthError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk layout of the credentials file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntries {
    version: u32,
    #[serde(default)]
    entries: HashMap<String, String>,
    #[serde(default)]
    last_updated: String,
}

/// JSON-file backed [`TokenStore`].
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file. Missing, unreadable or invalid files read as empty.
    fn load(&self) -> StoredEntries {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoredEntries::default(),
            Err(e) => {
                tracing::warn!("failed to read credentials file: {e}");
                return StoredEntries::default();
            }
        };

        match serde_json::from_str::<StoredEntries>(&data) {
            Ok(stored) if stored.version == STORAGE_VERSION => stored,
            Ok(stored) => {
                tracing::warn!("unsupported credentials file version: {}", stored.version);
                StoredEntries::default()
            }
            Err(e) => {
                tracing::warn!("failed to parse credentials file: {e}");
                StoredEntries::default()
            }
        }
    }

    /// Save the file, creating parent directories. Sets permissions to 0o600.
    fn save(&self, stored: &mut StoredEntries) -> Result<(), AuthError> {
        stored.version = STORAGE_VERSION;
        stored.last_updated = chrono::Utc::now().to_rfc3339();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(stored)?;
        std::fs::write(&self.path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self, key: &str) -> Option<String> {
        self.load().entries.remove(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock();
        let mut stored = self.load();
        let _ = stored.entries.insert(key.to_string(), value.to_string());
        self.save(&mut stored)
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock();
        if !self.path.exists() {
            return Ok(());
        }
        let mut stored = self.load();
        if stored.entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&mut stored)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        let _ = store
            .entries
            .write()
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let _ = self
            .entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let _ = self.entries.write().remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
