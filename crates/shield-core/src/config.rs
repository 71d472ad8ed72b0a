//! Shield configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use shield_navigation::PollSchedule;
use shield_privacy::{FragmentCleaner, GuardTable, RuleSet, DEFAULT_FRAGMENT_PARAMS};

use crate::error::CoreError;
use crate::Result;

/// User settings; every key is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Parameter name -> domain suffixes where it is never removed
    pub whitelist: BTreeMap<String, Vec<String>>,
    /// Startup polling interval (ms); 0 disables polling
    pub poll_interval: u64,
    /// Startup polling window (ms); 0 disables polling
    pub poll_duration: u64,
    /// How long notifications stay visible (ms)
    pub toast_duration: u64,
    /// Command menu label refresh period (ms)
    pub menu_refresh_interval: u64,
    /// Parameters removed from fragments
    pub fragment_params: Vec<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(param) = self.whitelist.keys().find(|p| p.trim().is_empty()) {
            return Err(CoreError::Config(format!(
                "whitelist has an empty parameter name: {param:?}"
            )));
        }
        if self.fragment_params.iter().any(|p| p.trim().is_empty()) {
            return Err(CoreError::Config(
                "fragmentParams contains an empty name".to_string(),
            ));
        }
        if self.menu_refresh_interval == 0 {
            return Err(CoreError::Config(
                "menuRefreshInterval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("PrivacyShield"))
            .unwrap_or_else(|| PathBuf::from(".privacy-shield"))
    }

    /// Default location of the site data database
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("site-data.db")
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::from_millis(self.poll_interval, self.poll_duration)
    }

    pub fn guard_table(&self) -> GuardTable {
        GuardTable::from_whitelist(
            self.whitelist
                .iter()
                .map(|(param, suffixes)| (param.as_str(), suffixes.clone())),
        )
    }

    /// Built-in rules guarded by `whitelist`
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::builtin().with_guards(self.guard_table())
    }

    pub fn fragment_cleaner(&self) -> Result<FragmentCleaner> {
        Ok(FragmentCleaner::from_params(&self.fragment_params)?)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration)
    }

    pub fn menu_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.menu_refresh_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whitelist: BTreeMap::new(),
            poll_interval: 500,
            poll_duration: 2000,
            toast_duration: 3500,
            menu_refresh_interval: 10_000,
            fragment_params: DEFAULT_FRAGMENT_PARAMS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

// Platform data directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
