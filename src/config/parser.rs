use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use polite_frontier::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Shards: {}", config.frontier.shard_count);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// Missing `[crawler]` table and missing frontier options fall back to their
/// defaults (query limit 40, depth limit 15, 20 shards).
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a ledger can be matched to the configuration that
/// produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[frontier]
seed-urls = ["https://www.ics.uci.edu/", "https://www.cs.uci.edu/"]
time-delay = 250
query-limit = 10
depth-limit = 8
shard-count = 4
save-file = "crawl.db"

[crawler]
workers = 2
user-agent = "TestBot/1.0"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.frontier.seed_urls.len(), 2);
        assert_eq!(config.frontier.time_delay().as_millis(), 250);
        assert_eq!(config.frontier.query_limit, 10);
        assert_eq!(config.frontier.depth_limit, 8);
        assert_eq!(config.frontier.shard_count, 4);
        assert_eq!(config.frontier.save_file, std::path::PathBuf::from("crawl.db"));
        assert_eq!(config.crawler.workers, 2);
        assert_eq!(config.crawler.user_agent, "TestBot/1.0");
    }

    #[test]
    fn test_defaults_applied() {
        let config_content = r#"
[frontier]
seed-urls = ["https://example.com/"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.frontier.query_limit, 40);
        assert_eq!(config.frontier.depth_limit, 15);
        assert_eq!(config.frontier.shard_count, 20);
        assert_eq!(config.frontier.save_file, std::path::PathBuf::from("frontier.db"));
        assert_eq!(config.crawler.workers, 4);
        assert_eq!(config.crawler.backoff_max, 2000);
    }

    #[test]
    fn test_parse_config_without_seeds() {
        let config = parse_config("[frontier]\nsave-file = \"x.db\"\n").unwrap();
        assert!(config.frontier.seed_urls.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[frontier]
seed-urls = ["https://example.com/"]
shard-count = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
