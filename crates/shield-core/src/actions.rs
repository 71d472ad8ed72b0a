//! Manual actions behind the command menu

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use shield_session::{SessionStats, StatsCounter};
use shield_storage::{clear, clear_all, ClearOperation, ClearReport, StorageCleaner};

use crate::menu::{CommandMenu, CommandRegistrar};
use crate::notify::NotificationUi;

pub const PROJECT_URL: &str = "https://github.com/combined/privacy-shield";

const RELOAD_PROMPT: &str =
    "Reload the page to complete cleanup?\n(Clears any server-set cookies too.)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ClearAll,
    ClearBasicStorage,
    ClearCookies,
    ClearDatabases,
    ClearCachesAndWorkers,
    ShowStats,
    OpenProjectPage,
}

struct Messages {
    success: &'static str,
    partial: &'static str,
    failure: &'static str,
}

impl Action {
    /// Menu order
    pub const ALL: [Action; 7] = [
        Action::ClearAll,
        Action::ClearBasicStorage,
        Action::ClearCookies,
        Action::ClearDatabases,
        Action::ClearCachesAndWorkers,
        Action::ShowStats,
        Action::OpenProjectPage,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Action::ClearAll => "clear-all",
            Action::ClearBasicStorage => "clear-basic-storage",
            Action::ClearCookies => "clear-cookies",
            Action::ClearDatabases => "clear-databases",
            Action::ClearCachesAndWorkers => "clear-caches-and-workers",
            Action::ShowStats => "show-stats",
            Action::OpenProjectPage => "open-project-page",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn label(&self, stats: &SessionStats) -> String {
        match self {
            Action::ClearAll => "Clear All Site Data...".to_string(),
            Action::ClearBasicStorage => "Clear Storage (Local & Session)...".to_string(),
            Action::ClearCookies => "Clear Cookies...".to_string(),
            Action::ClearDatabases => "Clear Databases...".to_string(),
            Action::ClearCachesAndWorkers => "Clear Caches & Service Workers...".to_string(),
            Action::ShowStats => format!("Session Stats (stripped: {})", stats.tokens_stripped),
            Action::OpenProjectPage => "PrivacyShield on GitHub".to_string(),
        }
    }

    /// Storage operations this action runs; empty for non-clearing actions
    pub fn operations(&self) -> &'static [ClearOperation] {
        match self {
            Action::ClearAll => &ClearOperation::ALL,
            Action::ClearBasicStorage => {
                &[ClearOperation::LocalStorage, ClearOperation::SessionStorage]
            }
            Action::ClearCookies => &[ClearOperation::Cookies],
            Action::ClearDatabases => &[ClearOperation::Databases],
            Action::ClearCachesAndWorkers => &[ClearOperation::Caches, ClearOperation::Workers],
            Action::ShowStats | Action::OpenProjectPage => &[],
        }
    }

    pub fn is_destructive(&self) -> bool {
        !self.operations().is_empty()
    }

    fn prompt(&self) -> &'static str {
        match self {
            Action::ClearAll => {
                "Clear ALL data for this site?\n\n\
                 Includes: local storage, session storage, cookies,\n\
                 databases, caches, service workers.\n\n\
                 You may be logged out. This cannot be undone."
            }
            Action::ClearBasicStorage => {
                "Clear local and session storage for this site?\n\
                 Saved preferences and temporary data will be lost."
            }
            Action::ClearCookies => "Clear all cookies for this site?\nYou may be logged out.",
            Action::ClearDatabases => {
                "Clear on-device databases for this site?\n\
                 Offline data and cached content will be removed."
            }
            Action::ClearCachesAndWorkers => {
                "Clear caches and unregister service workers for this site?\n\n\
                 This removes cached assets and any background tracking scripts.\n\
                 The site will re-download resources on next load."
            }
            Action::ShowStats | Action::OpenProjectPage => "",
        }
    }

    fn messages(&self) -> Messages {
        match self {
            Action::ClearAll => Messages {
                success: "All site data cleared.",
                partial: "Partial clear - see the log for details.",
                failure: "Error during cleanup.",
            },
            Action::ClearBasicStorage => Messages {
                success: "Local and session storage cleared.",
                partial: "Partial storage cleanup - see the log for details.",
                failure: "Cleanup failed.",
            },
            Action::ClearCookies => Messages {
                success: "Cookies cleared.",
                partial: "Cookie cleanup failed.",
                failure: "Cookie cleanup failed.",
            },
            Action::ClearDatabases => Messages {
                success: "Databases cleared.",
                partial: "Partial database cleanup - see the log for details.",
                failure: "Partial database cleanup - see the log for details.",
            },
            Action::ClearCachesAndWorkers => Messages {
                success: "Caches and service workers cleared.",
                partial: "Partial clear - see the log for details.",
                failure: "Cache cleanup failed.",
            },
            Action::ShowStats | Action::OpenProjectPage => Messages {
                success: "",
                partial: "",
                failure: "",
            },
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The user declined the confirmation
    Cancelled,
    Cleared(ClearReport),
    /// Clear-all succeeded and the user asked for a reload
    ReloadRequested(ClearReport),
    StatsShown(SessionStats),
    /// The host should open this address in a new tab
    OpenUrl(String),
}

pub struct ActionRunner<S, N, R: CommandRegistrar> {
    cleaner: S,
    notifier: N,
    menu: Arc<CommandMenu<R>>,
    stats: Arc<StatsCounter>,
}

impl<S, N, R> ActionRunner<S, N, R>
where
    S: StorageCleaner,
    N: NotificationUi,
    R: CommandRegistrar,
{
    pub fn new(
        cleaner: S,
        notifier: N,
        menu: Arc<CommandMenu<R>>,
        stats: Arc<StatsCounter>,
    ) -> Self {
        Self {
            cleaner,
            notifier,
            menu,
            stats,
        }
    }

    pub fn cleaner(&self) -> &S {
        &self.cleaner
    }

    pub fn menu(&self) -> &Arc<CommandMenu<R>> {
        &self.menu
    }

    pub async fn run(&self, action: Action) -> ActionOutcome {
        match action {
            Action::ShowStats => {
                self.notifier.show(&self.stats.summary(), true, false);
                ActionOutcome::StatsShown(self.stats.snapshot())
            }
            Action::OpenProjectPage => ActionOutcome::OpenUrl(PROJECT_URL.to_string()),
            _ => self.run_clear(action).await,
        }
    }

    async fn run_clear(&self, action: Action) -> ActionOutcome {
        if !self.notifier.confirm(action.prompt()) {
            tracing::debug!(action = %action, "Clear cancelled");
            return ActionOutcome::Cancelled;
        }

        let report = if action == Action::ClearAll {
            clear_all(&self.cleaner).await
        } else {
            clear(&self.cleaner, action.operations()).await
        };

        // Counted even when some operations failed
        self.stats.record_clear();
        self.menu.refresh();

        let messages = action.messages();
        if report.all_ok() {
            self.notifier.show(messages.success, true, false);
        } else if report.any_ok() {
            self.notifier.show(messages.partial, false, true);
        } else {
            self.notifier.show(messages.failure, false, false);
        }

        tracing::info!(
            action = %action,
            ok = report.all_ok(),
            failed = ?report.failed(),
            "Clear action finished"
        );

        if action == Action::ClearAll && report.all_ok() && self.notifier.confirm(RELOAD_PROMPT) {
            return ActionOutcome::ReloadRequested(report);
        }

        ActionOutcome::Cleared(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::tests::RecordingRegistrar;
    use parking_lot::Mutex;
    use std::future::Future;

    #[derive(Default)]
    struct ScriptedNotifier {
        answers: Mutex<Vec<bool>>,
        prompts: Mutex<Vec<String>>,
        shown: Mutex<Vec<(String, bool, bool)>>,
    }

    impl ScriptedNotifier {
        fn answering(answers: &[bool]) -> Self {
            let notifier = Self::default();
            *notifier.answers.lock() = answers.iter().rev().copied().collect();
            notifier
        }
    }

    impl NotificationUi for ScriptedNotifier {
        fn show(&self, message: &str, success: bool, warning: bool) {
            self.shown.lock().push((message.to_string(), success, warning));
        }

        fn confirm(&self, message: &str) -> bool {
            self.prompts.lock().push(message.to_string());
            self.answers.lock().pop().unwrap_or(true)
        }
    }

    /// Succeeds everywhere except the listed operations
    struct StubCleaner {
        failing: Vec<ClearOperation>,
    }

    impl StubCleaner {
        fn ok(&self, op: ClearOperation) -> bool {
            !self.failing.contains(&op)
        }
    }

    impl StorageCleaner for StubCleaner {
        fn clear_local_storage(&self) -> bool {
            self.ok(ClearOperation::LocalStorage)
        }

        fn clear_session_storage(&self) -> bool {
            self.ok(ClearOperation::SessionStorage)
        }

        fn clear_cookies(&self) -> bool {
            self.ok(ClearOperation::Cookies)
        }

        fn clear_databases(&self) -> impl Future<Output = bool> + Send {
            let ok = self.ok(ClearOperation::Databases);
            async move { ok }
        }

        fn clear_caches(&self) -> impl Future<Output = bool> + Send {
            let ok = self.ok(ClearOperation::Caches);
            async move { ok }
        }

        fn unregister_workers(&self) -> impl Future<Output = bool> + Send {
            let ok = self.ok(ClearOperation::Workers);
            async move { ok }
        }
    }

    fn runner(
        failing: Vec<ClearOperation>,
        answers: &[bool],
    ) -> ActionRunner<StubCleaner, ScriptedNotifier, RecordingRegistrar> {
        let stats = Arc::new(StatsCounter::new());
        let menu = Arc::new(CommandMenu::new(RecordingRegistrar::default(), stats.clone()));
        menu.refresh();
        ActionRunner::new(
            StubCleaner { failing },
            ScriptedNotifier::answering(answers),
            menu,
            stats,
        )
    }

    #[test]
    fn test_action_ids_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_id(action.id()), Some(action));
        }
        assert_eq!(Action::from_id("clear-everything"), None);
    }

    #[tokio::test]
    async fn test_clear_all_then_reload() {
        let runner = runner(vec![], &[true, true]);
        let outcome = runner.run(Action::ClearAll).await;

        match outcome {
            ActionOutcome::ReloadRequested(report) => assert!(report.all_ok()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(runner.stats.clears_performed(), 1);
        assert_eq!(runner.notifier.prompts.lock().len(), 2);
        assert_eq!(
            runner.notifier.shown.lock()[0],
            ("All site data cleared.".to_string(), true, false)
        );
    }

    #[tokio::test]
    async fn test_clear_all_reload_declined() {
        let runner = runner(vec![], &[true, false]);
        assert!(matches!(
            runner.run(Action::ClearAll).await,
            ActionOutcome::Cleared(_)
        ));
    }

    #[tokio::test]
    async fn test_partial_clear_still_counts() {
        let runner = runner(vec![ClearOperation::Databases], &[true]);
        let outcome = runner.run(Action::ClearAll).await;

        let ActionOutcome::Cleared(report) = outcome else {
            panic!("partial clear must not offer a reload");
        };
        assert_eq!(report.failed(), vec![ClearOperation::Databases]);
        assert_eq!(runner.stats.clears_performed(), 1);
        assert_eq!(runner.notifier.prompts.lock().len(), 1);

        let shown = runner.notifier.shown.lock();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].2, "partial success is a warning");
    }

    #[tokio::test]
    async fn test_failure_notification() {
        let runner = runner(vec![ClearOperation::Cookies], &[true]);
        runner.run(Action::ClearCookies).await;

        assert_eq!(
            runner.notifier.shown.lock()[0],
            ("Cookie cleanup failed.".to_string(), false, false)
        );
        assert_eq!(runner.stats.clears_performed(), 1);
    }

    #[tokio::test]
    async fn test_declined_confirmation() {
        let runner = runner(vec![], &[false]);
        assert_eq!(
            runner.run(Action::ClearBasicStorage).await,
            ActionOutcome::Cancelled
        );
        assert_eq!(runner.stats.clears_performed(), 0);
        assert!(runner.notifier.shown.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clear_refreshes_menu() {
        let runner = runner(vec![], &[true]);
        runner.stats.record_stripped(3);
        runner.run(Action::ClearCachesAndWorkers).await;

        assert!(runner
            .menu()
            .registrar()
            .labels()
            .contains(&"Session Stats (stripped: 3)".to_string()));
    }

    #[tokio::test]
    async fn test_show_stats_and_project_page() {
        let runner = runner(vec![], &[]);
        runner.stats.record_stripped(2);

        let ActionOutcome::StatsShown(stats) = runner.run(Action::ShowStats).await else {
            panic!("expected stats");
        };
        assert_eq!(stats.tokens_stripped, 2);
        assert!(runner.notifier.shown.lock()[0]
            .0
            .contains("Tracking tokens stripped:  2"));
        assert!(runner.notifier.prompts.lock().is_empty());

        assert_eq!(
            runner.run(Action::OpenProjectPage).await,
            ActionOutcome::OpenUrl(PROJECT_URL.to_string())
        );
    }
}
