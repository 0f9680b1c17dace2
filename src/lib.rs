//! Corpus-Sieve: a curation pipeline for news and forum article collections
//!
//! This crate enriches keyword-scoped article collections with their body
//! text, learns per-host extraction rules as it goes, drops near-duplicates
//! and filters the remainder for topical relevance with an external LLM.

pub mod classify;
pub mod config;
pub mod dataset;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Corpus-Sieve operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Classifier error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Invalid regex in redirection map: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Record store and cache errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Errors raised by a single completion call
///
/// These never escape the classifier: every variant triggers a backoff and
/// another attempt.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response had no choices")]
    EmptyResponse,

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
}

/// Result type alias for Corpus-Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{DatasetKey, DatasetKind, Record, RecordDocument, Stage};
pub use url::host_of;
