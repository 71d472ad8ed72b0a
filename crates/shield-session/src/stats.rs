//! Session statistics

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub tokens_stripped: u64,
    pub clears_performed: u64,
    /// When this page session began
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            tokens_stripped: 0,
            clears_performed: 0,
            started_at: Utc::now(),
        }
    }
}

/// Owner of the page's [`SessionStats`].
///
/// Share it as `Arc<StatsCounter>`; the increment methods are the only
/// way to change the counts.
#[derive(Debug)]
pub struct StatsCounter {
    stats: RwLock<SessionStats>,
}

impl StatsCounter {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(SessionStats::new()),
        }
    }

    pub fn snapshot(&self) -> SessionStats {
        *self.stats.read()
    }

    pub fn tokens_stripped(&self) -> u64 {
        self.stats.read().tokens_stripped
    }

    pub fn clears_performed(&self) -> u64 {
        self.stats.read().clears_performed
    }

    pub fn record_stripped(&self, count: u64) {
        if count == 0 {
            return;
        }
        let total = {
            let mut stats = self.stats.write();
            stats.tokens_stripped = stats.tokens_stripped.saturating_add(count);
            stats.tokens_stripped
        };
        tracing::debug!(count, total, "Recorded stripped tokens");
    }

    pub fn record_clear(&self) {
        let total = {
            let mut stats = self.stats.write();
            stats.clears_performed = stats.clears_performed.saturating_add(1);
            stats.clears_performed
        };
        tracing::debug!(total, "Recorded manual clear");
    }

    /// Multi-line text for the stats display
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "PrivacyShield - Session Stats\n\
             Tracking tokens stripped:  {}\n\
             Manual data clears done:   {}\n\
             Session started:           {}",
            stats.tokens_stripped,
            stats.clears_performed,
            stats.started_at.format("%H:%M:%S UTC"),
        )
    }
}

impl Default for StatsCounter {
    fn default() -> Self {
        Self::new()
    }
}
