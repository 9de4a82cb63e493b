//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TubelinkSettings::default()`]
//! 2. If `~/.tubelink/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{ReentryPolicy, TubelinkSettings};

/// Resolve the tubelink data directory (`~/.tubelink`).
pub fn tubelink_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tubelink")
}

/// Resolve the path to the settings file (`~/.tubelink/settings.json`).
pub fn settings_path() -> PathBuf {
    tubelink_dir().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TubelinkSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or values that fail
/// [`TubelinkSettings::validate`] are errors.
pub fn load_settings_from_path(path: &Path) -> Result<TubelinkSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Defaults merged with the user file, without env overrides.
fn load_file_layer(path: &Path) -> Result<TubelinkSettings> {
    let defaults = serde_json::to_value(TubelinkSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (file/default value wins).
pub fn apply_env_overrides(settings: &mut TubelinkSettings) {
    if let Some(v) = read_env_string("TUBELINK_API_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = read_env_u64("TUBELINK_POLL_INTERVAL_MS", 100, 60_000) {
        settings.connect.poll_interval_ms = v;
    }
    if let Some(v) = read_env_u64("TUBELINK_REFRESH_DELAY_MS", 0, 60_000) {
        settings.connect.refresh_delay_ms = v;
    }
    if let Some(v) = read_env_u64("TUBELINK_POPUP_TIMEOUT_MS", 1000, 86_400_000) {
        settings.connect.popup_timeout_ms = Some(v);
    }
    if let Some(v) = read_env_string("TUBELINK_REENTRY_POLICY") {
        match parse_reentry_policy(&v) {
            Some(policy) => settings.connect.reentry = policy,
            None => tracing::warn!(key = "TUBELINK_REENTRY_POLICY", value = %v, "invalid policy, ignoring"),
        }
    }
    if let Some(v) = read_env_string("TUBELINK_BROWSER") {
        settings.popup.browser_path = Some(v);
    }
    if let Some(v) = read_env_string("TUBELINK_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a re-entry policy name (case-insensitive).
pub fn parse_reentry_policy(val: &str) -> Option<ReentryPolicy> {
    match val.to_lowercase().as_str() {
        "reject" => Some(ReentryPolicy::Reject),
        "supersede" => Some(ReentryPolicy::Supersede),
        _ => None,
    }
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
