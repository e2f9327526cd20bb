//! Crawler module: the frontier and the crawl loop built on it
//!
//! This module contains:
//! - The scheduler over domain-bucket shards (round-robin, per-shard delay)
//! - The frontier orchestrator (admission, dequeue, completion, recovery)
//! - HTTP fetching and HTML link extraction
//! - The worker pool that drives a crawl to completion

mod backoff;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod scheduler;

pub use backoff::Backoff;
pub use coordinator::{run_crawl, Coordinator, CrawlSummary};
pub use fetcher::{build_http_client, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::{AddOutcome, Frontier, Rejection};
pub use parser::{Extractor, HtmlExtractor};
pub use scheduler::Scheduler;
