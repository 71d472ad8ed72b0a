//! Terminal notifications

use std::io::{BufRead, Write};
use std::time::Duration;

use shield_core::{LogNotifier, NotificationUi};

/// Prints notifications to stderr and asks confirmations on the terminal.
/// Every notification is also logged.
pub struct ConsoleNotifier {
    log: LogNotifier,
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new(toast_duration: Duration, assume_yes: bool) -> Self {
        Self {
            log: LogNotifier::new(toast_duration),
            assume_yes,
        }
    }

    pub fn toast_duration(&self) -> Duration {
        self.log.toast_duration()
    }
}

impl NotificationUi for ConsoleNotifier {
    fn show(&self, message: &str, success: bool, warning: bool) {
        self.log.show(message, success, warning);
        let tag = if warning {
            "warning"
        } else if success {
            "ok"
        } else {
            "error"
        };
        eprintln!("[{tag}] {message}");
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut stderr = std::io::stderr().lock();
        if write!(stderr, "{message}\n[y/N] ").and_then(|_| stderr.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
