//! Host command menu

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use shield_session::StatsCounter;

use crate::actions::Action;

/// The host's menu primitive. Activating an entry should end up in
/// [`ActionRunner::run`](crate::ActionRunner::run) with its [`Action`].
pub trait CommandRegistrar: Send + Sync {
    type Handle: Send;

    fn register(&self, action: Action, label: &str) -> Self::Handle;

    fn unregister(&self, handle: Self::Handle);
}

/// The fixed action list, re-registered whenever labels may have changed.
pub struct CommandMenu<R: CommandRegistrar> {
    registrar: R,
    stats: Arc<StatsCounter>,
    handles: Mutex<Vec<R::Handle>>,
}

impl<R: CommandRegistrar> CommandMenu<R> {
    pub fn new(registrar: R, stats: Arc<StatsCounter>) -> Self {
        Self {
            registrar,
            stats,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Drop every registered entry and register the list again with
    /// current labels
    pub fn refresh(&self) {
        let stats = self.stats.snapshot();
        let mut handles = self.handles.lock();

        for handle in handles.drain(..) {
            self.registrar.unregister(handle);
        }
        for action in Action::ALL {
            let handle = self.registrar.register(action, &action.label(&stats));
            handles.push(handle);
        }

        tracing::trace!(entries = handles.len(), "Command menu registered");
    }

    pub fn spawn_refresh(self: &Arc<Self>, every: Duration) -> JoinHandle<()>
    where
        R: 'static,
    {
        let menu = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                menu.refresh();
            }
        })
    }
}

/// Registrar without a visible menu; entries only show up in the log.
#[derive(Debug, Default)]
pub struct LogRegistrar {
    next: AtomicU64,
}

impl LogRegistrar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandRegistrar for LogRegistrar {
    type Handle = u64;

    fn register(&self, action: Action, label: &str) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, action = action.id(), label, "Registered command");
        id
    }

    fn unregister(&self, handle: u64) {
        tracing::trace!(id = handle, "Unregistered command");
    }
}
