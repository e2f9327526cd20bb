//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use polite_frontier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("frontier.toml")).unwrap();
//! println!("Politeness delay: {:?}", config.frontier.time_delay());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FrontierConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
