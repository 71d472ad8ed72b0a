//! Address-change signals

use serde::{Deserialize, Serialize};

/// Why the watcher woke up. Carries no address: the live location is
/// always re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationSignal {
    InitialLoad,
    HistoryReplace,
    HistoryPop,
    HashChange,
    PollTick,
}

impl NavigationSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationSignal::InitialLoad => "initial_load",
            NavigationSignal::HistoryReplace => "history_replace",
            NavigationSignal::HistoryPop => "history_pop",
            NavigationSignal::HashChange => "hash_change",
            NavigationSignal::PollTick => "poll_tick",
        }
    }
}

impl std::fmt::Display for NavigationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
