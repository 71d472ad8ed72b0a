//! Database migrations
//!
//! One table per kind of site data, each keyed by origin except cookies,
//! which are keyed by the domain they were set for.

use crate::Result;
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let result = conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    });

    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1: site data schema");

    // localStorage / sessionStorage
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS web_storage (
            origin TEXT NOT NULL,
            area TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (origin, area, key)
        );
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cookies (
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            domain TEXT NOT NULL,
            path TEXT NOT NULL DEFAULT '/',
            PRIMARY KEY (name, domain, path)
        );

        CREATE INDEX IF NOT EXISTS idx_cookies_domain ON cookies(domain);
    "#,
    )?;

    // IndexedDB-style databases; `blocked` marks one held open elsewhere
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS site_databases (
            origin TEXT NOT NULL,
            name TEXT NOT NULL,
            blocked INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            PRIMARY KEY (origin, name)
        );
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            origin TEXT NOT NULL,
            cache_name TEXT NOT NULL,
            request_url TEXT NOT NULL,
            stored_at TEXT NOT NULL,
            PRIMARY KEY (origin, cache_name, request_url)
        );
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS service_workers (
            origin TEXT NOT NULL,
            scope TEXT NOT NULL,
            script_url TEXT NOT NULL,
            registered_at TEXT NOT NULL,
            PRIMARY KEY (origin, scope)
        );
    "#,
    )?;

    Ok(())
}
