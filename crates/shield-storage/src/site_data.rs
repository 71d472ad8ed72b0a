//! Site data tables
//!
//! Writers exist so hosts (and tests) can populate what a page would have
//! stored; the `remove_*` methods back the cleaner.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::origin::SiteOrigin;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Local,
    Session,
}

impl StorageArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Local => "local",
            StorageArea::Session => "session",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Result of removing an origin's databases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSweep {
    pub removed: usize,
    /// Databases held open elsewhere; left in place
    pub blocked: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SiteData {
    db: Database,
}

impl SiteData {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn set_item(
        &self,
        origin: &SiteOrigin,
        area: StorageArea,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO web_storage (origin, area, key, value) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(origin, area, key) DO UPDATE SET value = excluded.value",
                rusqlite::params![origin.as_str(), area.as_str(), key, value],
            )?;
            Ok(())
        })
    }

    pub fn items(&self, origin: &SiteOrigin, area: StorageArea) -> Result<Vec<(String, String)>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value FROM web_storage WHERE origin = ?1 AND area = ?2 ORDER BY key",
            )?;
            let items = stmt
                .query_map(rusqlite::params![origin.as_str(), area.as_str()], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
    }

    pub fn remove_items(&self, origin: &SiteOrigin, area: StorageArea) -> Result<usize> {
        self.db.with_connection(|conn| {
            Ok(conn.execute(
                "DELETE FROM web_storage WHERE origin = ?1 AND area = ?2",
                rusqlite::params![origin.as_str(), area.as_str()],
            )?)
        })
    }

    pub fn set_cookie(&self, cookie: &Cookie) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO cookies (name, value, domain, path) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name, domain, path) DO UPDATE SET value = excluded.value",
                rusqlite::params![cookie.name, cookie.value, cookie.domain, cookie.path],
            )?;
            Ok(())
        })
    }

    /// Cookies visible to the origin: its host and its apex, with or
    /// without a leading dot
    pub fn cookies_for(&self, origin: &SiteOrigin) -> Result<Vec<Cookie>> {
        let domains = origin.cookie_domains();
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, value, domain, path FROM cookies WHERE domain = ?1 ORDER BY name, path",
            )?;
            let mut cookies = Vec::new();
            for domain in &domains {
                let rows = stmt.query_map([domain], |row| {
                    Ok(Cookie {
                        name: row.get(0)?,
                        value: row.get(1)?,
                        domain: row.get(2)?,
                        path: row.get(3)?,
                    })
                })?;
                for cookie in rows {
                    cookies.push(cookie?);
                }
            }
            Ok(cookies)
        })
    }

    pub fn remove_cookies(&self, origin: &SiteOrigin) -> Result<usize> {
        let domains = origin.cookie_domains();
        self.db.transaction(|conn| {
            let mut removed = 0;
            for domain in &domains {
                removed += conn.execute("DELETE FROM cookies WHERE domain = ?1", [domain])?;
            }
            Ok(removed)
        })
    }

    pub fn create_database(&self, origin: &SiteOrigin, name: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO site_databases (origin, name, blocked, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                rusqlite::params![origin.as_str(), name, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    /// Mark a database as held open by another connection
    pub fn set_blocked(&self, origin: &SiteOrigin, name: &str, blocked: bool) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "UPDATE site_databases SET blocked = ?1 WHERE origin = ?2 AND name = ?3",
                rusqlite::params![blocked, origin.as_str(), name],
            )?;
            Ok(())
        })
    }

    pub fn databases(&self, origin: &SiteOrigin) -> Result<Vec<String>> {
        self.db.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM site_databases WHERE origin = ?1 ORDER BY name")?;
            let names = stmt
                .query_map([origin.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
    }

    pub fn remove_databases(&self, origin: &SiteOrigin) -> Result<DatabaseSweep> {
        self.db.transaction(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM site_databases WHERE origin = ?1 AND blocked != 0 ORDER BY name",
            )?;
            let blocked = stmt
                .query_map([origin.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;

            let removed = conn.execute(
                "DELETE FROM site_databases WHERE origin = ?1 AND blocked = 0",
                [origin.as_str()],
            )?;

            Ok(DatabaseSweep { removed, blocked })
        })
    }

    pub fn put_cache_entry(
        &self,
        origin: &SiteOrigin,
        cache_name: &str,
        request_url: &str,
    ) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO cache_entries (origin, cache_name, request_url, stored_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(origin, cache_name, request_url) DO UPDATE SET stored_at = excluded.stored_at",
                rusqlite::params![
                    origin.as_str(),
                    cache_name,
                    request_url,
                    Utc::now().to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    pub fn cache_names(&self, origin: &SiteOrigin) -> Result<Vec<String>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT cache_name FROM cache_entries WHERE origin = ?1 ORDER BY cache_name",
            )?;
            let names = stmt
                .query_map([origin.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
    }

    /// Returns the number of caches dropped
    pub fn remove_caches(&self, origin: &SiteOrigin) -> Result<usize> {
        let names = self.cache_names(origin)?;
        self.db.with_connection(|conn| {
            conn.execute(
                "DELETE FROM cache_entries WHERE origin = ?1",
                [origin.as_str()],
            )?;
            Ok(names.len())
        })
    }

    pub fn register_worker(&self, origin: &SiteOrigin, scope: &str, script_url: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO service_workers (origin, scope, script_url, registered_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(origin, scope) DO UPDATE SET
                    script_url = excluded.script_url,
                    registered_at = excluded.registered_at",
                rusqlite::params![origin.as_str(), scope, script_url, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    /// Registered worker scopes
    pub fn workers(&self, origin: &SiteOrigin) -> Result<Vec<String>> {
        self.db.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT scope FROM service_workers WHERE origin = ?1 ORDER BY scope")?;
            let scopes = stmt
                .query_map([origin.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(scopes)
        })
    }

    pub fn unregister_workers(&self, origin: &SiteOrigin) -> Result<usize> {
        self.db.with_connection(|conn| {
            Ok(conn.execute(
                "DELETE FROM service_workers WHERE origin = ?1",
                [origin.as_str()],
            )?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SiteData, SiteOrigin) {
        let data = SiteData::new(Database::open_in_memory().unwrap());
        let origin = SiteOrigin::parse("https://www.example.com/page").unwrap();
        (data, origin)
    }

    fn cookie(name: &str, domain: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: "v".to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
        }
    }

    #[test]
    fn test_storage_areas_are_separate() {
        let (data, origin) = setup();
        data.set_item(&origin, StorageArea::Local, "theme", "dark").unwrap();
        data.set_item(&origin, StorageArea::Local, "theme", "light").unwrap();
        data.set_item(&origin, StorageArea::Session, "cart", "3").unwrap();

        assert_eq!(
            data.items(&origin, StorageArea::Local).unwrap(),
            vec![("theme".to_string(), "light".to_string())]
        );

        assert_eq!(data.remove_items(&origin, StorageArea::Session).unwrap(), 1);
        assert!(data.items(&origin, StorageArea::Session).unwrap().is_empty());
        assert_eq!(data.items(&origin, StorageArea::Local).unwrap().len(), 1);
    }

    #[test]
    fn test_cookie_scope() {
        let (data, origin) = setup();
        data.set_cookie(&cookie("sid", "www.example.com")).unwrap();
        data.set_cookie(&cookie("_ga", ".example.com")).unwrap();
        data.set_cookie(&cookie("other", "other.org")).unwrap();
        data.set_cookie(&cookie("sibling", "shop.example.com")).unwrap();

        let names: Vec<_> = data
            .cookies_for(&origin)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["sid", "_ga"]);

        assert_eq!(data.remove_cookies(&origin).unwrap(), 2);
        assert!(data.cookies_for(&origin).unwrap().is_empty());

        let other = SiteOrigin::parse("https://other.org/").unwrap();
        assert_eq!(data.cookies_for(&other).unwrap().len(), 1);
    }

    #[test]
    fn test_blocked_database_survives() {
        let (data, origin) = setup();
        data.create_database(&origin, "app").unwrap();
        data.create_database(&origin, "cache-db").unwrap();
        data.set_blocked(&origin, "app", true).unwrap();

        let sweep = data.remove_databases(&origin).unwrap();
        assert_eq!(sweep.removed, 1);
        assert_eq!(sweep.blocked, vec!["app"]);
        assert_eq!(data.databases(&origin).unwrap(), vec!["app"]);
    }

    #[test]
    fn test_caches_and_workers() {
        let (data, origin) = setup();
        data.put_cache_entry(&origin, "v1", "https://www.example.com/a.js").unwrap();
        data.put_cache_entry(&origin, "v1", "https://www.example.com/b.js").unwrap();
        data.put_cache_entry(&origin, "images", "https://www.example.com/c.png").unwrap();
        data.register_worker(&origin, "/", "/sw.js").unwrap();

        assert_eq!(data.cache_names(&origin).unwrap(), vec!["images", "v1"]);
        assert_eq!(data.remove_caches(&origin).unwrap(), 2);
        assert!(data.cache_names(&origin).unwrap().is_empty());

        assert_eq!(data.workers(&origin).unwrap(), vec!["/"]);
        assert_eq!(data.unregister_workers(&origin).unwrap(), 1);
        assert!(data.workers(&origin).unwrap().is_empty());
    }
}
