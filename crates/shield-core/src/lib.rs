//! PrivacyShield Core
//!
//! Wires the domain crates together:
//! - [`Config`] loads user settings (guards, poll window, display timings)
//! - [`Shield`] owns the rule set and session stats and installs the
//!   navigation watcher on a history host
//! - [`ActionRunner`] runs the manual clear actions behind the command menu
//! - [`harden`] applies the one-shot page hardening steps

mod actions;
mod config;
mod error;
mod hardening;
mod menu;
mod notify;
mod shield;

pub use actions::{Action, ActionOutcome, ActionRunner, PROJECT_URL};
pub use config::Config;
pub use error::{CoreError, HostError};
pub use hardening::{harden, init_script, HardeningReport, HardeningStep, PageHardening};
pub use menu::{CommandMenu, CommandRegistrar, LogRegistrar};
pub use notify::{LogNotifier, NotificationUi};
pub use shield::{Installed, Shield};

// Re-export domain crates
pub use shield_navigation::{
    HistoryHost, InterceptedHistory, MemoryHistory, NavigationError, NavigationSignal,
    NavigationSource, NavigationWatcher, PollSchedule, Rewrite, WatchReport,
};
pub use shield_privacy::{FragmentCleaner, GuardTable, PrivacyError, RuleSet, UrlRewriter};
pub use shield_session::{SessionStats, StatsCounter};
pub use shield_storage::{
    ClearOperation, ClearReport, Database, SiteData, SiteDataCleaner, SiteOrigin, StorageCleaner,
    StorageError,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
