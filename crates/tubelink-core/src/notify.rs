//! User-facing notification sink.
//!
//! Notifications are fire-and-forget: a [`Notifier`] never reports delivery
//! failure back to the caller. The binary prints them to the terminal; tests
//! use [`RecordingNotifier`] to assert on what the user would have seen.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

/// Severity of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Something went wrong and the user has to act.
    Error,
    /// An operation completed.
    Success,
    /// Neutral information.
    Info,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Success => f.write_str("success"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// A single notification as delivered to the sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message shown to the user.
    pub message: String,
}

/// One-way channel for user-facing messages.
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Deliver an error notification.
    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }

    /// Deliver a success notification.
    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    /// Deliver an informational notification.
    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }
}

/// Notifier that forwards every message to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => tracing::error!(target: "tubelink::notice", "{message}"),
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!(target: "tubelink::notice", %level, "{message}");
            }
        }
    }
}

/// In-memory notifier that keeps every notice in delivery order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notices delivered so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Notices of a single level.
    pub fn notices_at(&self, level: NoticeLevel) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == level)
            .cloned()
            .collect()
    }

    /// Whether nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().push(Notice {
            level,
            message: message.to_string(),
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_delivery_order() {
        let sink = RecordingNotifier::new();
        sink.error("a");
        sink.success("b");
        sink.info("c");

        let levels: Vec<_> = sink.notices().iter().map(|n| n.level).collect();
        assert_eq!(
            levels,
            vec![NoticeLevel::Error, NoticeLevel::Success, NoticeLevel::Info]
        );
        assert_eq!(sink.notices()[1].message, "b");
    }

    #[test]
    fn notices_at_filters_by_level() {
        let sink = RecordingNotifier::new();
        sink.error("one");
        sink.info("two");
        sink.error("three");

        let errors = sink.notices_at(NoticeLevel::Error);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].message, "three");
    }

    #[test]
    fn clear_empties_recorder() {
        let sink = RecordingNotifier::new();
        sink.info("x");
        assert!(!sink.is_empty());
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_notifier_accepts_all_levels() {
        let sink = TracingNotifier;
        sink.error("e");
        sink.success("s");
        sink.info("i");
    }

    #[test]
    fn notice_serializes_lowercase_level() {
        let notice = Notice {
            level: NoticeLevel::Success,
            message: "done".into(),
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["message"], "done");
    }

    #[test]
    fn level_display() {
        assert_eq!(NoticeLevel::Error.to_string(), "error");
        assert_eq!(NoticeLevel::Info.to_string(), "info");
    }
}
