//! On-demand clearing of site data

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::origin::SiteOrigin;
use crate::site_data::{SiteData, StorageArea};
use crate::Result;

/// Site data clearing as seen by the manual actions.
///
/// Each operation is independent and reports its own success; a failure in
/// one must not stop the caller from running the others.
pub trait StorageCleaner: Send + Sync {
    fn clear_local_storage(&self) -> bool;

    fn clear_session_storage(&self) -> bool;

    /// Cookies on the current host and its parent domain
    fn clear_cookies(&self) -> bool;

    fn clear_databases(&self) -> impl Future<Output = bool> + Send;

    fn clear_caches(&self) -> impl Future<Output = bool> + Send;

    fn unregister_workers(&self) -> impl Future<Output = bool> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClearOperation {
    LocalStorage,
    SessionStorage,
    Cookies,
    Databases,
    Caches,
    Workers,
}

impl ClearOperation {
    pub const ALL: [ClearOperation; 6] = [
        ClearOperation::LocalStorage,
        ClearOperation::SessionStorage,
        ClearOperation::Cookies,
        ClearOperation::Databases,
        ClearOperation::Caches,
        ClearOperation::Workers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ClearOperation::LocalStorage => "local storage",
            ClearOperation::SessionStorage => "session storage",
            ClearOperation::Cookies => "cookies",
            ClearOperation::Databases => "databases",
            ClearOperation::Caches => "caches",
            ClearOperation::Workers => "service workers",
        }
    }

    pub async fn run<C: StorageCleaner>(&self, cleaner: &C) -> bool {
        match self {
            ClearOperation::LocalStorage => cleaner.clear_local_storage(),
            ClearOperation::SessionStorage => cleaner.clear_session_storage(),
            ClearOperation::Cookies => cleaner.clear_cookies(),
            ClearOperation::Databases => cleaner.clear_databases().await,
            ClearOperation::Caches => cleaner.clear_caches().await,
            ClearOperation::Workers => cleaner.unregister_workers().await,
        }
    }
}

impl std::fmt::Display for ClearOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-operation results of one clear action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    results: Vec<(ClearOperation, bool)>,
}

impl ClearReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, operation: ClearOperation, ok: bool) {
        self.results.push((operation, ok));
    }

    pub fn results(&self) -> &[(ClearOperation, bool)] {
        &self.results
    }

    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }

    pub fn any_ok(&self) -> bool {
        self.results.iter().any(|(_, ok)| *ok)
    }

    pub fn failed(&self) -> Vec<ClearOperation> {
        self.results
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(op, _)| *op)
            .collect()
    }
}

/// Run the given operations in order
pub async fn clear<C: StorageCleaner>(cleaner: &C, operations: &[ClearOperation]) -> ClearReport {
    let mut report = ClearReport::new();
    for operation in operations {
        let ok = operation.run(cleaner).await;
        report.record(*operation, ok);
    }
    report
}

/// Run every operation; the asynchronous ones run concurrently
pub async fn clear_all<C: StorageCleaner>(cleaner: &C) -> ClearReport {
    let mut report = ClearReport::new();
    report.record(ClearOperation::LocalStorage, cleaner.clear_local_storage());
    report.record(ClearOperation::SessionStorage, cleaner.clear_session_storage());
    report.record(ClearOperation::Cookies, cleaner.clear_cookies());

    let (databases, caches, workers) = tokio::join!(
        cleaner.clear_databases(),
        cleaner.clear_caches(),
        cleaner.unregister_workers()
    );
    report.record(ClearOperation::Databases, databases);
    report.record(ClearOperation::Caches, caches);
    report.record(ClearOperation::Workers, workers);

    report
}

/// [`StorageCleaner`] over the SQLite site data store, bound to one origin
#[derive(Debug, Clone)]
pub struct SiteDataCleaner {
    data: SiteData,
    origin: SiteOrigin,
}

impl SiteDataCleaner {
    pub fn new(data: SiteData, origin: SiteOrigin) -> Self {
        Self { data, origin }
    }

    pub fn origin(&self) -> &SiteOrigin {
        &self.origin
    }

    pub fn data(&self) -> &SiteData {
        &self.data
    }

    fn clear_area(&self, area: StorageArea) -> bool {
        match self.data.remove_items(&self.origin, area) {
            Ok(count) => {
                tracing::info!(origin = %self.origin, area = area.as_str(), count, "Storage cleared");
                true
            }
            Err(e) => {
                tracing::warn!(origin = %self.origin, area = area.as_str(), error = %e, "Failed to clear storage");
                false
            }
        }
    }

    /// Run a store operation off the async runtime
    fn blocking<T, F>(&self, f: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send + 'static,
        F: FnOnce(&SiteData, &SiteOrigin) -> Result<T> + Send + 'static,
    {
        let data = self.data.clone();
        let origin = self.origin.clone();
        async move { tokio::task::spawn_blocking(move || f(&data, &origin)).await? }
    }
}

impl StorageCleaner for SiteDataCleaner {
    fn clear_local_storage(&self) -> bool {
        self.clear_area(StorageArea::Local)
    }

    fn clear_session_storage(&self) -> bool {
        self.clear_area(StorageArea::Session)
    }

    fn clear_cookies(&self) -> bool {
        match self.data.remove_cookies(&self.origin) {
            Ok(count) => {
                tracing::info!(origin = %self.origin, count, "Cookies cleared");
                true
            }
            Err(e) => {
                tracing::warn!(origin = %self.origin, error = %e, "Failed to clear cookies");
                false
            }
        }
    }

    fn clear_databases(&self) -> impl Future<Output = bool> + Send {
        let origin = self.origin.clone();
        let sweep = self.blocking(|data, origin| data.remove_databases(origin));
        async move {
            match sweep.await {
                Ok(sweep) if sweep.blocked.is_empty() => {
                    tracing::info!(origin = %origin, count = sweep.removed, "Databases deleted");
                    true
                }
                Ok(sweep) => {
                    tracing::warn!(
                        origin = %origin,
                        blocked = ?sweep.blocked,
                        "Database deletion blocked"
                    );
                    false
                }
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "Failed to delete databases");
                    false
                }
            }
        }
    }

    fn clear_caches(&self) -> impl Future<Output = bool> + Send {
        let origin = self.origin.clone();
        let removed = self.blocking(|data, origin| data.remove_caches(origin));
        async move {
            match removed.await {
                Ok(count) => {
                    tracing::info!(origin = %origin, count, "Caches cleared");
                    true
                }
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "Failed to clear caches");
                    false
                }
            }
        }
    }

    fn unregister_workers(&self) -> impl Future<Output = bool> + Send {
        let origin = self.origin.clone();
        let removed = self.blocking(|data, origin| data.unregister_workers(origin));
        async move {
            match removed.await {
                Ok(count) => {
                    tracing::info!(origin = %origin, count, "Service workers unregistered");
                    true
                }
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "Failed to unregister workers");
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::site_data::Cookie;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn populated() -> SiteDataCleaner {
        let data = SiteData::new(Database::open_in_memory().unwrap());
        let origin = SiteOrigin::parse("https://app.example.com/dashboard").unwrap();

        data.set_item(&origin, StorageArea::Local, "token", "abc").unwrap();
        data.set_item(&origin, StorageArea::Session, "step", "2").unwrap();
        data.set_cookie(&Cookie {
            name: "sid".to_string(),
            value: "1".to_string(),
            domain: ".example.com".to_string(),
            path: "/".to_string(),
        })
        .unwrap();
        data.create_database(&origin, "app").unwrap();
        data.put_cache_entry(&origin, "v1", "https://app.example.com/app.js").unwrap();
        data.register_worker(&origin, "/", "/sw.js").unwrap();

        SiteDataCleaner::new(data, origin)
    }

    #[tokio::test]
    async fn test_clear_all_empties_site() {
        let cleaner = populated();
        let report = clear_all(&cleaner).await;

        assert!(report.all_ok());
        assert_eq!(report.results().len(), 6);

        let (data, origin) = (cleaner.data(), cleaner.origin());
        assert!(data.items(origin, StorageArea::Local).unwrap().is_empty());
        assert!(data.items(origin, StorageArea::Session).unwrap().is_empty());
        assert!(data.cookies_for(origin).unwrap().is_empty());
        assert!(data.databases(origin).unwrap().is_empty());
        assert!(data.cache_names(origin).unwrap().is_empty());
        assert!(data.workers(origin).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_database_reports_failure() {
        let cleaner = populated();
        cleaner
            .data()
            .set_blocked(cleaner.origin(), "app", true)
            .unwrap();

        let report = clear_all(&cleaner).await;
        assert!(!report.all_ok());
        assert!(report.any_ok());
        assert_eq!(report.failed(), vec![ClearOperation::Databases]);

        // The rest still ran
        assert!(cleaner.data().workers(cleaner.origin()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_subset_in_order() {
        let cleaner = populated();
        let report = clear(
            &cleaner,
            &[ClearOperation::LocalStorage, ClearOperation::SessionStorage],
        )
        .await;

        assert_eq!(
            report.results(),
            &[
                (ClearOperation::LocalStorage, true),
                (ClearOperation::SessionStorage, true)
            ]
        );
        assert_eq!(cleaner.data().cookies_for(cleaner.origin()).unwrap().len(), 1);
    }

    struct CountingCleaner {
        calls: AtomicUsize,
    }

    impl StorageCleaner for CountingCleaner {
        fn clear_local_storage(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            false
        }

        fn clear_session_storage(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn clear_cookies(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            false
        }

        fn clear_databases(&self) -> impl Future<Output = bool> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { true }
        }

        fn clear_caches(&self) -> impl Future<Output = bool> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        }

        fn unregister_workers(&self) -> impl Future<Output = bool> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { true }
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_short_circuit() {
        let cleaner = CountingCleaner {
            calls: AtomicUsize::new(0),
        };
        let report = clear_all(&cleaner).await;

        assert_eq!(cleaner.calls.load(Ordering::SeqCst), 6);
        assert_eq!(
            report.failed(),
            vec![
                ClearOperation::LocalStorage,
                ClearOperation::Cookies,
                ClearOperation::Caches
            ]
        );
    }

    #[test]
    fn test_empty_report_is_ok() {
        assert!(ClearReport::new().all_ok());
        assert!(!ClearReport::new().any_ok());
    }
}
