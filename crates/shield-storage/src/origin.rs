//! Site origins and cookie scoping

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StorageError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteOrigin {
    /// `scheme://host[:port]`
    origin: String,
    host: String,
}

impl SiteOrigin {
    /// Accepts any address on the site, e.g. the current page URL
    pub fn parse(address: &str) -> Result<Self> {
        let url = Url::parse(address).map_err(|e| StorageError::InvalidOrigin(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(StorageError::InvalidOrigin(address.to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| StorageError::InvalidOrigin(address.to_string()))?
            .to_lowercase();

        Ok(Self {
            origin: url.origin().ascii_serialization(),
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.origin
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Registrable domain (eTLD+1) per the Public Suffix List. IP
    /// addresses and bare suffixes are their own apex.
    pub fn apex(&self) -> &str {
        let host = self.host.as_str();
        if host.parse::<std::net::IpAddr>().is_ok() {
            return host;
        }
        psl::domain_str(host).unwrap_or(host)
    }

    /// Every cookie `domain` value this site can see and clear
    pub fn cookie_domains(&self) -> Vec<String> {
        let mut domains = vec![self.host.clone(), format!(".{}", self.host)];
        let apex = self.apex();
        if apex != self.host {
            domains.push(apex.to_string());
            domains.push(format!(".{apex}"));
        }
        domains
    }
}

impl std::fmt::Display for SiteOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.origin)
    }
}
