//! History host seam
//!
//! [`HistoryHost`] is the only way the watcher touches the page: read the
//! live address, replace the current entry in place.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::NavigationError;
use crate::Result;

pub trait HistoryHost: Send + Sync {
    /// The live address of the current entry
    fn location(&self) -> Result<String>;

    /// Replace the current entry without navigating or adding an entry
    fn replace_state(&self, url: &str) -> Result<()>;
}

impl<H: HistoryHost + ?Sized> HistoryHost for Arc<H> {
    fn location(&self) -> Result<String> {
        (**self).location()
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        (**self).replace_state(url)
    }
}

#[derive(Debug)]
struct Entries {
    urls: Vec<String>,
    index: usize,
}

/// In-process session history with back/forward entries.
///
/// `push` and `navigate_fragment` change the address without telling
/// anyone, the way client-side routers do.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RwLock<Entries>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(Entries {
                urls: vec![initial.into()],
                index: 0,
            }),
        }
    }

    /// Add an entry after the current one, dropping any forward entries
    pub fn push(&self, url: impl Into<String>) {
        let mut entries = self.entries.write();
        let keep = entries.index + 1;
        entries.urls.truncate(keep);
        entries.urls.push(url.into());
        entries.index = keep;
    }

    /// Fragment navigation; `fragment` may include the leading `#`
    pub fn navigate_fragment(&self, fragment: &str) -> String {
        let current = self.current();
        let base = current.split('#').next().unwrap_or_default();
        let fragment = fragment.trim_start_matches('#');
        let url = if fragment.is_empty() {
            base.to_string()
        } else {
            format!("{base}#{fragment}")
        };
        self.push(url.clone());
        url
    }

    pub fn back(&self) -> Result<String> {
        let mut entries = self.entries.write();
        if entries.index == 0 {
            return Err(NavigationError::NoEntry);
        }
        entries.index -= 1;
        Ok(entries.urls[entries.index].clone())
    }

    pub fn forward(&self) -> Result<String> {
        let mut entries = self.entries.write();
        if entries.index + 1 >= entries.urls.len() {
            return Err(NavigationError::NoEntry);
        }
        entries.index += 1;
        Ok(entries.urls[entries.index].clone())
    }

    pub fn current(&self) -> String {
        let entries = self.entries.read();
        entries.urls[entries.index].clone()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.read().urls.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().urls.is_empty()
    }
}

impl HistoryHost for MemoryHistory {
    fn location(&self) -> Result<String> {
        Ok(self.current())
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let index = entries.index;
        entries.urls[index] = url.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_and_forward() {
        let history = MemoryHistory::new("https://example.com/a");
        history.push("https://example.com/b");
        history.push("https://example.com/c");

        assert_eq!(history.back().unwrap(), "https://example.com/b");
        assert_eq!(history.back().unwrap(), "https://example.com/a");
        assert!(history.back().is_err());
        assert_eq!(history.forward().unwrap(), "https://example.com/b");

        // pushing drops the forward entry
        history.push("https://example.com/d");
        assert_eq!(history.len(), 3);
        assert!(history.forward().is_err());
    }

    #[test]
    fn test_replace_keeps_entry_count() {
        let history = MemoryHistory::new("https://example.com/?fbclid=1");
        history.replace_state("https://example.com/").unwrap();
        assert_eq!(history.entries(), vec!["https://example.com/"]);
    }

    #[test]
    fn test_navigate_fragment() {
        let history = MemoryHistory::new("https://example.com/page#old");
        let url = history.navigate_fragment("#new&fbclid=1");
        assert_eq!(url, "https://example.com/page#new&fbclid=1");
        assert_eq!(history.location().unwrap(), url);
        assert_eq!(history.len(), 2);
    }
}
