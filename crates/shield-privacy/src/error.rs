//! Privacy error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrivacyError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Address has no host: {0}")]
    MissingHost(String),

    #[error("Invalid fragment pattern: {0}")]
    Pattern(#[from] regex::Error),
}
