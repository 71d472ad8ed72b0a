//! User-facing notifications

use std::time::Duration;

pub trait NotificationUi: Send + Sync {
    /// Show a transient message. `warning` marks a partial success.
    fn show(&self, message: &str, success: bool, warning: bool);

    /// Ask before a destructive action
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Renders notifications as log events; confirms everything.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    toast_duration: Duration,
}

impl LogNotifier {
    pub fn new(toast_duration: Duration) -> Self {
        Self { toast_duration }
    }

    pub fn toast_duration(&self) -> Duration {
        self.toast_duration
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(3500))
    }
}

impl NotificationUi for LogNotifier {
    fn show(&self, message: &str, success: bool, warning: bool) {
        let visible_ms = self.toast_duration.as_millis() as u64;
        if warning {
            tracing::warn!(visible_ms, "{}", message);
        } else if success {
            tracing::info!(visible_ms, "{}", message);
        } else {
            tracing::error!(visible_ms, "{}", message);
        }
    }
}
