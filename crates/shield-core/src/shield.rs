//! The composition point
//!
//! [`Shield`] builds the immutable rule state once from [`Config`] and
//! hands out everything that shares it: rewriters, the session counter
//! and, through [`Shield::install`], a watcher bound to a history host.

use std::sync::Arc;

use shield_navigation::{
    plan_rewrite, HistoryHost, InterceptedHistory, NavigationSignal, NavigationSource,
    NavigationWatcher, Rewrite, SignalReceiver,
};
use shield_privacy::{FragmentCleaner, RuleSet, UrlRewriter};
use shield_session::StatsCounter;

use crate::config::Config;
use crate::Result;

pub struct Shield {
    config: Config,
    rules: Arc<RuleSet>,
    fragments: FragmentCleaner,
    stats: Arc<StatsCounter>,
}

/// A watcher wired to one history host.
///
/// Page code gets `history`; host glue emits pop and hash signals through
/// `source`. Spawn `watcher.run(signals)` to start watching.
pub struct Installed<H> {
    pub history: InterceptedHistory<H>,
    pub source: NavigationSource,
    pub watcher: NavigationWatcher<H>,
    pub signals: SignalReceiver,
}

impl Shield {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let rules = Arc::new(config.rule_set());
        let fragments = config.fragment_cleaner()?;

        tracing::info!(
            rules = rules.len(),
            fragment_params = fragments.patterns().len(),
            "Privacy shield ready"
        );

        Ok(Self {
            config,
            rules,
            fragments,
            stats: Arc::new(StatsCounter::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn stats(&self) -> &Arc<StatsCounter> {
        &self.stats
    }

    pub fn rewriter(&self) -> UrlRewriter {
        UrlRewriter::new(self.rules.clone())
    }

    pub fn fragment_cleaner(&self) -> &FragmentCleaner {
        &self.fragments
    }

    /// One-off query and fragment cleaning; does not touch the stats
    pub fn strip_url(&self, address: &str) -> Option<Rewrite> {
        plan_rewrite(
            &self.rewriter(),
            &self.fragments,
            NavigationSignal::InitialLoad,
            address,
        )
    }

    pub fn clean_url(&self, address: &str) -> String {
        self.strip_url(address)
            .map(|rewrite| rewrite.to)
            .unwrap_or_else(|| address.to_string())
    }

    /// Wrap `history` and build the watcher that guards it.
    ///
    /// The watcher commits through the raw `history`; only the returned
    /// wrapper signals.
    pub fn install<H: HistoryHost>(&self, history: Arc<H>) -> Installed<H> {
        let (source, signals) = NavigationSource::channel();
        let intercepted = InterceptedHistory::new(history.clone(), source.clone());
        let watcher = NavigationWatcher::new(
            history,
            self.rewriter(),
            self.fragments.clone(),
            self.stats.clone(),
        )
        .with_schedule(self.config.poll_schedule());

        Installed {
            history: intercepted,
            source,
            watcher,
            signals,
        }
    }
}
