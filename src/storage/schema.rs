//! Database schema definitions
//!
//! This module contains the SQL schema of the ledger file.

/// SQL schema for the ledger
pub const SCHEMA_SQL: &str = r#"
-- Every URL ever admitted to the frontier
CREATE TABLE IF NOT EXISTS urls (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    url_hash TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_urls_completed ON urls(completed);

-- Facts about how the ledger was created (format version, shard count)
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Metadata key for the schema version
pub const META_FORMAT_VERSION: &str = "format-version";

/// Metadata key for the creation timestamp
pub const META_CREATED_AT: &str = "created-at";

/// Metadata key for the shard count the crawl was started with
pub const META_SHARD_COUNT: &str = "shard-count";

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
