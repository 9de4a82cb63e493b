//! # tubelink-core
//!
//! Shared plumbing used by every tubelink crate:
//! - [`logging`]: `tracing` subscriber setup
//! - [`notify`]: the fire-and-forget user notification sink

#![deny(unsafe_code)]

pub mod logging;
pub mod notify;

pub use logging::init_subscriber;
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
