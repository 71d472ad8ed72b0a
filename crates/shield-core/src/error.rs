//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Privacy error: {0}")]
    Privacy(#[from] shield_privacy::PrivacyError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] shield_navigation::NavigationError),

    #[error("Storage error: {0}")]
    Storage(#[from] shield_storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a one-shot host call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host capability unavailable: {0}")]
    Unavailable(String),

    #[error("Host call failed: {0}")]
    Failed(String),
}
