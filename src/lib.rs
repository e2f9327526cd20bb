//! Polite-Frontier: a persistent, politeness-aware crawl frontier
//!
//! This crate decides which URL a pool of fetch workers should download next.
//! It never hands out a URL twice, keeps a minimum delay between fetches to the
//! same site, refuses structural crawler traps, and survives restarts through a
//! durable SQLite ledger.

pub mod config;
pub mod crawler;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] storage::LedgerError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for frontier operations
pub type Result<T> = std::result::Result<T, FrontierError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{AddOutcome, Coordinator, Frontier, Rejection};
pub use state::{Shard, UrlRecord};
pub use storage::{Ledger, SqliteLedger};
pub use crate::url::{dedup_key, domain_bucket, is_fetchable, normalize_url};
