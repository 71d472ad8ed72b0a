//! Signal delivery
//!
//! Host glue (popstate/hashchange listeners, the intercepted replace
//! primitive) holds a [`NavigationSource`]; the watcher owns the matching
//! [`SignalReceiver`].

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::history::HistoryHost;
use crate::signal::NavigationSignal;
use crate::Result;

pub type SignalReceiver = mpsc::UnboundedReceiver<NavigationSignal>;

#[derive(Debug, Clone)]
pub struct NavigationSource {
    tx: mpsc::UnboundedSender<NavigationSignal>,
}

impl NavigationSource {
    pub fn channel() -> (Self, SignalReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns `false` once the watcher has gone away
    pub fn emit(&self, signal: NavigationSignal) -> bool {
        match self.tx.send(signal) {
            Ok(()) => true,
            Err(_) => {
                tracing::trace!(signal = %signal, "Watcher gone, signal dropped");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The replace primitive as page code sees it.
///
/// The caller's replace always runs first, then `HistoryReplace` is
/// emitted. A failed replace still emits the signal and is retried once;
/// the retry's result is what the caller gets.
#[derive(Debug, Clone)]
pub struct InterceptedHistory<H> {
    inner: Arc<H>,
    source: NavigationSource,
}

impl<H: HistoryHost> InterceptedHistory<H> {
    pub fn new(inner: Arc<H>, source: NavigationSource) -> Self {
        Self { inner, source }
    }

    /// The unwrapped primitive
    pub fn inner(&self) -> &Arc<H> {
        &self.inner
    }
}

impl<H: HistoryHost> HistoryHost for InterceptedHistory<H> {
    fn location(&self) -> Result<String> {
        self.inner.location()
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        match self.inner.replace_state(url) {
            Ok(()) => {
                self.source.emit(NavigationSignal::HistoryReplace);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Replace failed, retrying");
                self.source.emit(NavigationSignal::HistoryReplace);
                self.inner.replace_state(url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavigationError;
    use crate::history::MemoryHistory;
    use parking_lot::Mutex;

    /// Fails the first `failures` replace calls
    struct FlakyHistory {
        url: Mutex<String>,
        failures: Mutex<u32>,
        attempts: Mutex<u32>,
    }

    impl FlakyHistory {
        fn new(failures: u32) -> Self {
            Self {
                url: Mutex::new("https://example.com/".to_string()),
                failures: Mutex::new(failures),
                attempts: Mutex::new(0),
            }
        }
    }

    impl HistoryHost for FlakyHistory {
        fn location(&self) -> Result<String> {
            Ok(self.url.lock().clone())
        }

        fn replace_state(&self, url: &str) -> Result<()> {
            *self.attempts.lock() += 1;
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(NavigationError::Host("SecurityError".to_string()));
            }
            *self.url.lock() = url.to_string();
            Ok(())
        }
    }

    #[test]
    fn test_replace_then_signal() {
        let (source, mut signals) = NavigationSource::channel();
        let history = Arc::new(MemoryHistory::new("https://example.com/"));
        let intercepted = InterceptedHistory::new(history.clone(), source);

        intercepted
            .replace_state("https://example.com/next")
            .unwrap();

        assert_eq!(history.current(), "https://example.com/next");
        assert_eq!(signals.try_recv().unwrap(), NavigationSignal::HistoryReplace);
        assert!(signals.try_recv().is_err());
    }

    #[test]
    fn test_failed_replace_is_retried() {
        let (source, mut signals) = NavigationSource::channel();
        let host = Arc::new(FlakyHistory::new(1));
        let intercepted = InterceptedHistory::new(host.clone(), source);

        intercepted.replace_state("https://example.com/x").unwrap();

        assert_eq!(*host.attempts.lock(), 2);
        assert_eq!(host.location().unwrap(), "https://example.com/x");
        assert_eq!(signals.try_recv().unwrap(), NavigationSignal::HistoryReplace);
    }

    #[test]
    fn test_retry_failure_reaches_caller() {
        let (source, mut signals) = NavigationSource::channel();
        let host = Arc::new(FlakyHistory::new(2));
        let intercepted = InterceptedHistory::new(host, source);

        assert!(intercepted.replace_state("https://example.com/x").is_err());
        assert_eq!(signals.try_recv().unwrap(), NavigationSignal::HistoryReplace);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (source, signals) = NavigationSource::channel();
        drop(signals);
        assert!(source.is_closed());
        assert!(!source.emit(NavigationSignal::HashChange));
    }
}
