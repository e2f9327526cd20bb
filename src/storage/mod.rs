//! Storage module for the durable URL ledger
//!
//! This module handles all database operations for the frontier, including:
//! - SQLite ledger initialization and schema management
//! - Dedup-key lookups and completion tracking
//! - Ordered iteration for startup recovery
//! - Metadata describing the persisted format

mod schema;
mod sqlite;
mod traits;

pub use schema::{META_CREATED_AT, META_FORMAT_VERSION, META_SHARD_COUNT};
pub use sqlite::SqliteLedger;
pub use traits::{Ledger, LedgerError, LedgerResult};

use std::fmt;
use std::path::Path;

/// Opens the ledger at `path`, optionally discarding a previous crawl
///
/// # Returns
///
/// * `Ok(SqliteLedger)` - Successfully opened ledger
/// * `Err(LedgerError)` - Failed to open the ledger file
pub fn open_ledger(path: &Path, force_restart: bool) -> LedgerResult<SqliteLedger> {
    SqliteLedger::open(path, force_restart)
}

/// Record counts of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerStats {
    /// URLs ever admitted
    pub total: u64,

    /// URLs a worker has finished with
    pub completed: u64,
}

impl LedgerStats {
    /// URLs admitted but not yet completed
    pub fn pending(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }
}

impl fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} completed, {} pending",
            self.total,
            self.completed,
            self.pending()
        )
    }
}
