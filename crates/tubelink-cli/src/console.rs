//! Terminal notification sink.

use std::io::Write;

use tubelink_core::{NoticeLevel, Notifier, TracingNotifier};

/// Prints notices to stderr and mirrors them into the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier {
    log: TracingNotifier,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.log.notify(level, message);
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", format_notice(level, message));
    }
}

fn format_notice(level: NoticeLevel, message: &str) -> String {
    let tag = match level {
        NoticeLevel::Error => "✗",
        NoticeLevel::Success => "✓",
        NoticeLevel::Info => "•",
    };
    format!("{tag} {message}")
}
