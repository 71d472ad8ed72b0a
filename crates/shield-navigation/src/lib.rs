//! PrivacyShield Navigation Watcher
//!
//! Address-change signals:
//! - `InitialLoad` once at startup
//! - `HistoryReplace` from the intercepted replace primitive
//! - `HistoryPop` on back/forward
//! - `HashChange` on fragment-only navigation
//! - `PollTick` during the bounded startup window, for routers that
//!   change the address without any of the above
//!
//! Every signal re-reads the live address and, when the cleaned address
//! differs, commits it with a non-navigating replace.

mod error;
mod history;
mod schedule;
mod signal;
mod source;
mod watcher;

pub use error::NavigationError;
pub use history::{HistoryHost, MemoryHistory};
pub use schedule::PollSchedule;
pub use signal::NavigationSignal;
pub use source::{InterceptedHistory, NavigationSource, SignalReceiver};
pub use watcher::{plan_rewrite, NavigationWatcher, Rewrite, WatchReport};

pub type Result<T> = std::result::Result<T, NavigationError>;
