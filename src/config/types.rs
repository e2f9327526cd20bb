use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Frontier policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FrontierConfig {
    /// URLs a fresh crawl starts from
    #[serde(rename = "seed-urls", default)]
    pub seed_urls: Vec<String>,

    /// Minimum time between two dequeues from the same shard (milliseconds)
    #[serde(rename = "time-delay", default = "default_time_delay")]
    pub time_delay: u64,

    /// Maximum accepted query variants per query-stripped URL
    #[serde(rename = "query-limit", default = "default_query_limit")]
    pub query_limit: u32,

    /// Maximum number of path segments
    #[serde(rename = "depth-limit", default = "default_depth_limit")]
    pub depth_limit: usize,

    /// Number of domain-bucket queues
    #[serde(rename = "shard-count", default = "default_shard_count")]
    pub shard_count: usize,

    /// Path to the ledger file
    #[serde(rename = "save-file", default = "default_save_file")]
    pub save_file: PathBuf,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// First sleep after the frontier has nothing eligible (milliseconds)
    #[serde(rename = "backoff-initial", default = "default_backoff_initial")]
    pub backoff_initial: u64,

    /// Upper bound of the backoff sleep (milliseconds)
    #[serde(rename = "backoff-max", default = "default_backoff_max")]
    pub backoff_max: u64,
}

impl FrontierConfig {
    /// Frontier settings with every option at its default
    pub fn with_seeds(seed_urls: Vec<String>, save_file: impl Into<PathBuf>) -> Self {
        Self {
            seed_urls,
            time_delay: default_time_delay(),
            query_limit: default_query_limit(),
            depth_limit: default_depth_limit(),
            shard_count: default_shard_count(),
            save_file: save_file.into(),
        }
    }

    pub fn time_delay(&self) -> Duration {
        Duration::from_millis(self.time_delay)
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            backoff_initial: default_backoff_initial(),
            backoff_max: default_backoff_max(),
        }
    }
}

fn default_time_delay() -> u64 {
    500
}

fn default_query_limit() -> u32 {
    40
}

fn default_depth_limit() -> usize {
    15
}

fn default_shard_count() -> usize {
    20
}

fn default_save_file() -> PathBuf {
    PathBuf::from("frontier.db")
}

fn default_workers() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("polite-frontier/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_backoff_initial() -> u64 {
    50
}

fn default_backoff_max() -> u64 {
    2000
}
