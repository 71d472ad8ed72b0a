//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("History API unavailable: {0}")]
    Unavailable(String),

    #[error("History operation failed: {0}")]
    Host(String),

    #[error("No history entry to move to")]
    NoEntry,
}
