//! URL handling module
//!
//! This module decides whether a discovered URL is worth tracking: canonical
//! normalization, dedup-key derivation, scheme and extension filtering,
//! domain bucketing for shard assignment, and the trap heuristics applied at
//! insertion time.

mod domain;
mod filter;
mod normalize;
mod traps;

// Re-export main functions
pub use domain::{domain_bucket, extract_domain, registrable_domain};
pub use filter::{is_fetchable, is_fetchable_url, unfetchable_reason};
pub use normalize::{dedup_key, normalize_url, strip_query};
pub use traps::{has_query, path_depth, Admission, QueryCounts, TrapContext, TrapPolicy};
