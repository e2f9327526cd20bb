//! SQLite ledger implementation
//!
//! This module provides a SQLite-based implementation of the Ledger trait.

use crate::state::UrlRecord;
use crate::storage::schema::{
    get_schema_version, initialize_schema, META_CREATED_AT, META_FORMAT_VERSION,
};
use crate::storage::traits::{Ledger, LedgerError, LedgerResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite ledger backend
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens the ledger file at `path`
    ///
    /// With `force_restart`, an existing ledger (and its WAL side files) is
    /// deleted first so the crawl starts from nothing. Otherwise the existing
    /// file is opened, or created if absent.
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteLedger)` - Successfully opened/created ledger
    /// * `Err(LedgerError)` - Failed to remove, open, or initialize the file
    pub fn open(path: &Path, force_restart: bool) -> LedgerResult<Self> {
        let exists = path.exists();

        if exists && force_restart {
            tracing::info!("Found save file {}, deleting it", path.display());
            remove_ledger_files(path)?;
        } else if !exists && !force_restart {
            tracing::info!(
                "Did not find save file {}, starting from seed",
                path.display()
            );
        }

        let conn = Connection::open(path)?;

        // Every committed put must survive a process crash
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::from_connection(conn)
    }

    /// Creates an in-memory ledger (for testing)
    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> LedgerResult<Self> {
        initialize_schema(&conn)?;

        let mut ledger = Self { conn };
        match ledger.get_meta(META_FORMAT_VERSION)? {
            None => {
                ledger.set_meta(META_FORMAT_VERSION, &get_schema_version().to_string())?;
                ledger.set_meta(META_CREATED_AT, &Utc::now().to_rfc3339())?;
            }
            Some(version) if version != get_schema_version().to_string() => {
                return Err(LedgerError::Corrupt(format!(
                    "unsupported ledger format version {}",
                    version
                )));
            }
            Some(_) => {}
        }

        Ok(ledger)
    }

    /// Runs raw SQL against the ledger connection
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> LedgerResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Closes the underlying connection, surfacing any final I/O error
    pub fn close(self) -> LedgerResult<()> {
        self.conn.close().map_err(|(_, e)| LedgerError::from(e))
    }
}

impl Ledger for SqliteLedger {
    // ===== Records =====

    fn get(&self, key: &str) -> LedgerResult<Option<UrlRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT url, completed FROM urls WHERE url_hash = ?1",
                params![key],
                |row| {
                    Ok(UrlRecord {
                        canonical_url: row.get(0)?,
                        completed: row.get::<_, i64>(1)? != 0,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    fn put(&mut self, key: &str, record: &UrlRecord) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO urls (url_hash, url, completed) VALUES (?1, ?2, ?3)
             ON CONFLICT(url_hash) DO UPDATE SET
                url = excluded.url,
                completed = MAX(completed, excluded.completed)",
            params![key, record.canonical_url, record.completed as i64],
        )?;
        Ok(())
    }

    fn iterate(&self) -> LedgerResult<Vec<(String, UrlRecord)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url_hash, url, completed FROM urls ORDER BY seq ASC")?;

        let records = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    UrlRecord {
                        canonical_url: row.get(1)?,
                        completed: row.get::<_, i64>(2)? != 0,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Statistics =====

    fn len(&self) -> LedgerResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_completed(&self) -> LedgerResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE completed != 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Metadata =====

    fn get_meta(&self, key: &str) -> LedgerResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_meta(&mut self, key: &str, value: &str) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Deletes a ledger file together with its SQLite side files
fn remove_ledger_files(path: &Path) -> std::io::Result<()> {
    std::fs::remove_file(path)?;

    for suffix in ["-wal", "-shm"] {
        let mut side = PathBuf::from(path).into_os_string();
        side.push(suffix);
        match std::fs::remove_file(&side) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
