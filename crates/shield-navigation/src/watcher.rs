//! Navigation watcher
//!
//! ```text
//! Idle
//!   ↓ signal
//! Applying (read live address → clean query → clean fragment → replace)
//!   ↓ done or failed
//! Idle
//! ```
//!
//! `handle` takes `&mut self` and runs to completion, so a signal can
//! never arrive mid-rewrite. Commits go straight to the host primitive,
//! never through [`InterceptedHistory`](crate::InterceptedHistory), so a
//! rewrite does not wake the watcher again.

use std::future;
use std::sync::Arc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use shield_privacy::{FragmentCleaner, UrlRewriter};
use shield_session::StatsCounter;

use crate::history::HistoryHost;
use crate::schedule::PollSchedule;
use crate::signal::NavigationSignal;
use crate::source::SignalReceiver;
use crate::Result;

/// A committed address change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub signal: NavigationSignal,
    pub from: String,
    pub to: String,
    pub removed_params: Vec<String>,
    /// At least one fragment tracker pattern matched
    pub fragment_stripped: bool,
}

impl Rewrite {
    /// What this rewrite adds to `tokens_stripped`
    pub fn tokens(&self) -> u64 {
        self.removed_params.len() as u64 + u64::from(self.fragment_stripped)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchReport {
    pub signals: u64,
    pub poll_ticks: u64,
    pub rewrites: u64,
}

pub struct NavigationWatcher<H> {
    history: Arc<H>,
    rewriter: UrlRewriter,
    fragments: FragmentCleaner,
    stats: Arc<StatsCounter>,
    schedule: PollSchedule,
    report: WatchReport,
}

impl<H: HistoryHost> NavigationWatcher<H> {
    /// `history` must be the raw primitive, not the intercepted wrapper
    pub fn new(
        history: Arc<H>,
        rewriter: UrlRewriter,
        fragments: FragmentCleaner,
        stats: Arc<StatsCounter>,
    ) -> Self {
        Self {
            history,
            rewriter,
            fragments,
            stats,
            schedule: PollSchedule::default(),
            report: WatchReport::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    pub fn report(&self) -> WatchReport {
        self.report
    }

    /// Process one signal. Failures are logged and dropped; the next
    /// signal simply tries again.
    pub fn handle(&mut self, signal: NavigationSignal) -> Option<Rewrite> {
        self.report.signals += 1;
        if signal == NavigationSignal::PollTick {
            self.report.poll_ticks += 1;
        }

        match self.apply(signal) {
            Ok(Some(rewrite)) => {
                self.report.rewrites += 1;
                tracing::info!(
                    signal = %signal,
                    removed = ?rewrite.removed_params,
                    fragment = rewrite.fragment_stripped,
                    "Rewrote address"
                );
                Some(rewrite)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(signal = %signal, error = %e, "Rewrite skipped");
                None
            }
        }
    }

    fn apply(&self, signal: NavigationSignal) -> Result<Option<Rewrite>> {
        let live = self.history.location()?;
        let Some(rewrite) = self.plan(signal, &live) else {
            return Ok(None);
        };

        // Counted before the replace: a host that rejects it recounts the
        // same tokens on the next signal.
        self.stats.record_stripped(rewrite.tokens());
        self.history.replace_state(&rewrite.to)?;

        Ok(Some(rewrite))
    }

    /// The combined query + fragment rewrite for `address`, if any
    pub fn plan(&self, signal: NavigationSignal, address: &str) -> Option<Rewrite> {
        plan_rewrite(&self.rewriter, &self.fragments, signal, address)
    }

    /// Event loop: clean on startup, then handle signals and poll ticks
    /// until every [`NavigationSource`](crate::NavigationSource) is dropped.
    pub async fn run(mut self, mut signals: SignalReceiver) -> WatchReport {
        self.handle(NavigationSignal::InitialLoad);

        let start = Instant::now();
        let mut polling = self.schedule.is_enabled();
        let window = time::sleep_until(start + self.schedule.duration());
        tokio::pin!(window);

        let mut ticker = polling.then(|| {
            let interval = self.schedule.interval();
            let mut ticker = time::interval_at(start + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        tracing::debug!(
            interval_ms = self.schedule.interval().as_millis() as u64,
            ticks = self.schedule.tick_count(),
            "Watching navigation"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut window, if polling => {
                    polling = false;
                    ticker = None;
                    tracing::debug!("Poll window closed");
                }
                signal = signals.recv() => {
                    let Some(signal) = signal else { break };
                    self.handle(signal);
                }
                _ = next_tick(&mut ticker), if polling => {
                    self.handle(NavigationSignal::PollTick);
                }
            }
        }

        tracing::debug!(
            signals = self.report.signals,
            rewrites = self.report.rewrites,
            "Navigation watcher stopped"
        );

        self.report
    }
}

/// Query and fragment cleaning of one address, combined into a single
/// rewrite. `None` when the address is already clean.
pub fn plan_rewrite(
    rewriter: &UrlRewriter,
    fragments: &FragmentCleaner,
    signal: NavigationSignal,
    address: &str,
) -> Option<Rewrite> {
    let stripped = rewriter.strip(address);

    let (base, fragment) = split_fragment(&stripped.address);
    // `location.hash` reads a bare `#` as empty
    let hash = if fragment == "#" { "" } else { fragment };
    let cleaned = fragments.strip(hash);
    let fragment_changed = cleaned.fragment != hash;

    if !stripped.is_changed() && !fragment_changed {
        return None;
    }

    let to = if fragment_changed {
        format!("{base}{}", cleaned.fragment)
    } else {
        stripped.address.clone()
    };

    Some(Rewrite {
        signal,
        from: address.to_string(),
        to,
        removed_params: stripped.removed,
        fragment_stripped: cleaned.matched,
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

/// Split at the first `#`; the fragment half keeps its `#`
fn split_fragment(address: &str) -> (&str, &str) {
    match address.find('#') {
        Some(pos) => address.split_at(pos),
        None => (address, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavigationError;
    use crate::history::MemoryHistory;
    use crate::source::{InterceptedHistory, NavigationSource};
    use std::time::Duration;

    fn watcher_for<H: HistoryHost>(
        history: Arc<H>,
        stats: Arc<StatsCounter>,
    ) -> NavigationWatcher<H> {
        NavigationWatcher::new(
            history,
            UrlRewriter::default(),
            FragmentCleaner::default(),
            stats,
        )
    }

    #[test]
    fn test_initial_load_rewrites_in_place() {
        let history = Arc::new(MemoryHistory::new(
            "https://example.com/?utm_source=x&id=5&fbclid=abc",
        ));
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        let rewrite = watcher.handle(NavigationSignal::InitialLoad).unwrap();

        assert_eq!(rewrite.to, "https://example.com/?id=5");
        assert_eq!(history.entries(), vec!["https://example.com/?id=5"]);
        assert_eq!(stats.tokens_stripped(), 2);

        // nothing left to do on the next signal
        assert!(watcher.handle(NavigationSignal::PollTick).is_none());
        assert_eq!(stats.tokens_stripped(), 2);
    }

    #[test]
    fn test_excluded_host_not_counted() {
        let history = Arc::new(MemoryHistory::new("https://www.icloud.com/?gclid=z"));
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        assert!(watcher.handle(NavigationSignal::InitialLoad).is_none());
        assert_eq!(history.current(), "https://www.icloud.com/?gclid=z");
        assert_eq!(stats.tokens_stripped(), 0);
    }

    #[test]
    fn test_hash_change_counts_once() {
        let history = Arc::new(MemoryHistory::new("https://example.com/page"));
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        history.navigate_fragment("#section&fbclid=abc&_hsenc=x&x=1");
        let rewrite = watcher.handle(NavigationSignal::HashChange).unwrap();

        assert_eq!(rewrite.to, "https://example.com/page#section&x=1");
        assert_eq!(stats.tokens_stripped(), 1);
    }

    #[test]
    fn test_query_and_fragment_in_one_commit() {
        let history = Arc::new(MemoryHistory::new(
            "https://example.com/?gclid=1&utm_medium=m&q=2#fbclid=abc",
        ));
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        let rewrite = watcher.handle(NavigationSignal::InitialLoad).unwrap();

        assert_eq!(rewrite.to, "https://example.com/?q=2");
        assert_eq!(rewrite.tokens(), 3);
        assert_eq!(history.len(), 1);
        assert_eq!(stats.tokens_stripped(), 3);
    }

    #[test]
    fn test_fragment_cleaned_on_excluded_host() {
        let history = Arc::new(MemoryHistory::new(
            "https://www.icloud.com/?gclid=z#fbclid=abc",
        ));
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        watcher.handle(NavigationSignal::InitialLoad).unwrap();

        assert_eq!(history.current(), "https://www.icloud.com/?gclid=z");
        assert_eq!(stats.tokens_stripped(), 1);
    }

    #[test]
    fn test_pop_restores_dirty_entry() {
        let history = Arc::new(MemoryHistory::new("https://example.com/a?fbclid=1"));
        history.push("https://example.com/b");
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        history.back().unwrap();
        watcher.handle(NavigationSignal::HistoryPop).unwrap();

        assert_eq!(
            history.entries(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_intercepted_replace_wakes_watcher_once() {
        let history = Arc::new(MemoryHistory::new("https://example.com/"));
        let (source, mut signals) = NavigationSource::channel();
        let page_history = InterceptedHistory::new(history.clone(), source);
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats.clone());

        page_history
            .replace_state("https://example.com/list?utm_campaign=spring&page=2")
            .unwrap();

        let signal = signals.try_recv().unwrap();
        assert_eq!(signal, NavigationSignal::HistoryReplace);
        watcher.handle(signal).unwrap();

        assert_eq!(history.current(), "https://example.com/list?page=2");
        // the watcher's own commit emits nothing
        assert!(signals.try_recv().is_err());
    }

    struct BrokenHistory;

    impl HistoryHost for BrokenHistory {
        fn location(&self) -> Result<String> {
            Err(NavigationError::Unavailable("history".to_string()))
        }

        fn replace_state(&self, _url: &str) -> Result<()> {
            Err(NavigationError::Unavailable("history".to_string()))
        }
    }

    #[test]
    fn test_host_failure_is_swallowed() {
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(Arc::new(BrokenHistory), stats.clone());

        assert!(watcher.handle(NavigationSignal::InitialLoad).is_none());
        assert!(watcher.handle(NavigationSignal::HistoryPop).is_none());
        assert_eq!(watcher.report().signals, 2);
        assert_eq!(watcher.report().rewrites, 0);
    }

    /// Reads fine, rejects every replace
    struct ReadOnlyHistory(String);

    impl HistoryHost for ReadOnlyHistory {
        fn location(&self) -> Result<String> {
            Ok(self.0.clone())
        }

        fn replace_state(&self, _url: &str) -> Result<()> {
            Err(NavigationError::Unavailable("replaceState".to_string()))
        }
    }

    #[test]
    fn test_rejected_replace_recounts_tokens() {
        let stats = Arc::new(StatsCounter::new());
        let history = Arc::new(ReadOnlyHistory(
            "https://example.com/?utm_source=a&fbclid=b".to_string(),
        ));
        let mut watcher = watcher_for(history, stats.clone());

        assert!(watcher.handle(NavigationSignal::InitialLoad).is_none());
        assert_eq!(stats.tokens_stripped(), 2);

        assert!(watcher.handle(NavigationSignal::HistoryPop).is_none());
        assert_eq!(stats.tokens_stripped(), 4);
        assert_eq!(watcher.report().rewrites, 0);
    }

    #[test]
    fn test_non_http_address_ignored() {
        let history = Arc::new(MemoryHistory::new("about:blank"));
        let stats = Arc::new(StatsCounter::new());
        let mut watcher = watcher_for(history.clone(), stats);

        assert!(watcher.handle(NavigationSignal::InitialLoad).is_none());
        assert_eq!(history.current(), "about:blank");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_window_is_bounded() {
        let history = Arc::new(MemoryHistory::new("https://app.example.com/"));
        let (source, signals) = NavigationSource::channel();
        let stats = Arc::new(StatsCounter::new());
        let watcher = watcher_for(history.clone(), stats.clone());

        let task = tokio::spawn(watcher.run(signals));

        // a router swaps the address during boot without any signal
        time::sleep(Duration::from_millis(700)).await;
        history.push("https://app.example.com/home?utm_source=boot");
        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(history.current(), "https://app.example.com/home");

        // after the window closes only real signals are seen
        time::sleep(Duration::from_millis(1000)).await;
        history.push("https://app.example.com/late?utm_source=late");
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(
            history.current(),
            "https://app.example.com/late?utm_source=late"
        );

        source.emit(NavigationSignal::HistoryPop);
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(history.current(), "https://app.example.com/late");

        drop(source);
        let report = task.await.unwrap();
        assert_eq!(report.poll_ticks, 3);
        assert_eq!(report.rewrites, 2);
        assert_eq!(stats.tokens_stripped(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_schedule_never_ticks() {
        let history = Arc::new(MemoryHistory::new("https://example.com/"));
        let (source, signals) = NavigationSource::channel();
        let watcher = watcher_for(history, Arc::new(StatsCounter::new()))
            .with_schedule(PollSchedule::disabled());

        let task = tokio::spawn(watcher.run(signals));
        time::sleep(Duration::from_millis(5000)).await;
        drop(source);

        let report = task.await.unwrap();
        assert_eq!(report.poll_ticks, 0);
        assert_eq!(report.signals, 1);
    }
}
