//! PrivacyShield Site Data
//!
//! SQLite-backed storage for everything a site can leave behind:
//! - Local and session key/value storage
//! - Cookies (host and parent-domain scoped)
//! - On-device databases
//! - Response caches
//! - Background worker registrations
//!
//! [`StorageCleaner`] is the contract manual clear actions run against;
//! every operation reports its own success so one failure never aborts
//! the rest.

mod cleaner;
mod database;
mod error;
mod migrations;
mod origin;
mod site_data;

pub use cleaner::{
    clear, clear_all, ClearOperation, ClearReport, SiteDataCleaner, StorageCleaner,
};
pub use database::Database;
pub use error::StorageError;
pub use origin::SiteOrigin;
pub use site_data::{Cookie, DatabaseSweep, SiteData, StorageArea};

pub type Result<T> = std::result::Result<T, StorageError>;
