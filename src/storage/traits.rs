//! Ledger trait and error types
//!
//! This module defines the trait interface for durable URL ledgers and
//! associated error types.

use crate::state::UrlRecord;
use crate::storage::LedgerStats;
use thiserror::Error;

/// Errors that can occur during ledger operations
///
/// Every variant is fatal to a crawl run: resumability depends on the ledger
/// being an accurate record of what was discovered and completed.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt ledger: {0}")]
    Corrupt(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Trait for durable URL ledgers
///
/// Maps a dedup key to the canonical URL and its completion flag. Keys are
/// never removed and `completed` never reverts to false. A `put` must be
/// visible to every later `get` on the same ledger.
pub trait Ledger {
    // ===== Records =====

    /// Gets the record stored under a dedup key
    fn get(&self, key: &str) -> LedgerResult<Option<UrlRecord>>;

    /// Checks whether a dedup key has ever been written
    fn contains(&self, key: &str) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Durably writes a record
    ///
    /// An existing completed record stays completed even if `record` says
    /// otherwise.
    fn put(&mut self, key: &str, record: &UrlRecord) -> LedgerResult<()>;

    /// Returns every record in insertion order
    ///
    /// Used once at startup to rebuild in-memory frontier state.
    fn iterate(&self) -> LedgerResult<Vec<(String, UrlRecord)>>;

    // ===== Statistics =====

    /// Total number of records
    fn len(&self) -> LedgerResult<u64>;

    /// Number of records marked completed
    fn count_completed(&self) -> LedgerResult<u64>;

    /// Checks whether the ledger holds no records
    fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Gets total/completed counts in one call
    fn stats(&self) -> LedgerResult<LedgerStats> {
        Ok(LedgerStats {
            total: self.len()?,
            completed: self.count_completed()?,
        })
    }

    // ===== Metadata =====

    /// Gets a metadata value describing how the ledger was created
    fn get_meta(&self, key: &str) -> LedgerResult<Option<String>>;

    /// Sets a metadata value
    fn set_meta(&mut self, key: &str, value: &str) -> LedgerResult<()>;
}
