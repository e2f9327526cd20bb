//! State module for frontier bookkeeping
//!
//! # Components
//!
//! - `UrlRecord`: the persisted ledger entry for one discovered URL
//! - `Shard`: one domain-bucket FIFO queue plus its last dequeue time

mod shard;
mod url_record;

// Re-export main types
pub use shard::Shard;
pub use url_record::UrlRecord;
