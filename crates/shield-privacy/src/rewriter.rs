//! Query-string rewriting
//!
//! `clean` never fails: anything that cannot be parsed as an HTTP(S)
//! address comes back exactly as it went in.

use std::sync::Arc;
use url::Url;

use crate::error::PrivacyError;
use crate::rules::{Query, RuleSet};
use crate::Result;

/// Result of one rewrite pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub address: String,
    /// Distinct parameter names that were removed
    pub removed: Vec<String>,
}

impl Stripped {
    fn unchanged(address: &str) -> Self {
        Self {
            address: address.to_string(),
            removed: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct UrlRewriter {
    rules: Arc<RuleSet>,
}

impl UrlRewriter {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Strip tracking parameters from `address`
    pub fn clean(&self, address: &str) -> String {
        self.strip(address).address
    }

    /// Like [`clean`](Self::clean), also reporting what was removed
    pub fn strip(&self, address: &str) -> Stripped {
        match self.try_strip(address) {
            Ok(stripped) => stripped,
            Err(e) => {
                tracing::debug!(address = %address, error = %e, "Address left unchanged");
                Stripped::unchanged(address)
            }
        }
    }

    fn try_strip(&self, address: &str) -> Result<Stripped> {
        let mut url = Url::parse(address)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PrivacyError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| PrivacyError::MissingHost(address.to_string()))?
            .to_string();

        if self.rules.is_excluded(&host) {
            return Ok(Stripped::unchanged(address));
        }

        let before = match url.query() {
            Some(raw) => Query::parse(raw),
            None => return Ok(Stripped::unchanged(address)),
        };

        let after = self.rules.apply(&host, before.clone());
        let removed = before.removed_in(&after);
        if removed.is_empty() {
            return Ok(Stripped::unchanged(address));
        }

        url.set_query(after.to_query_string().as_deref());

        tracing::trace!(host = %host, removed = ?removed, "Stripped tracking parameters");

        Ok(Stripped {
            address: url.to_string(),
            removed,
        })
    }
}

impl Default for UrlRewriter {
    fn default() -> Self {
        Self::new(Arc::new(RuleSet::builtin()))
    }
}
