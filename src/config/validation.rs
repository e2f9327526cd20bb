use crate::config::types::{Config, CrawlerConfig, FrontierConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_frontier_config(&config.frontier)?;
    validate_seed_urls(&config.frontier.seed_urls)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates frontier policy limits
fn validate_frontier_config(config: &FrontierConfig) -> Result<(), ConfigError> {
    if config.shard_count < 1 {
        return Err(ConfigError::Validation(format!(
            "shard_count must be >= 1, got {}",
            config.shard_count
        )));
    }

    if config.query_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "query_limit must be >= 1, got {}",
            config.query_limit
        )));
    }

    if config.depth_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "depth_limit must be >= 1, got {}",
            config.depth_limit
        )));
    }

    if config.save_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "save_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed URLs: each must be an http(s) URL with a host
fn validate_seed_urls(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawl loop settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.backoff_initial > config.backoff_max {
        return Err(ConfigError::Validation(format!(
            "backoff_initial ({}ms) cannot exceed backoff_max ({}ms)",
            config.backoff_initial, config.backoff_max
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            frontier: FrontierConfig::with_seeds(
                vec!["https://www.ics.uci.edu/".to_string()],
                "frontier.db",
            ),
            crawler: CrawlerConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_zero_shards_rejected() {
        let mut config = valid_config();
        config.frontier.shard_count = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_save_file_rejected() {
        let mut config = valid_config();
        config.frontier.save_file = "".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_seed_scheme() {
        assert!(validate_seed_urls(&["http://example.com/".to_string()]).is_ok());
        assert!(validate_seed_urls(&["ftp://example.com/".to_string()]).is_err());
        assert!(matches!(
            validate_seed_urls(&["not a url".to_string()]),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_workers_range() {
        let mut config = valid_config();
        config.crawler.workers = 0;
        assert!(validate(&config).is_err());
        config.crawler.workers = 257;
        assert!(validate(&config).is_err());
        config.crawler.workers = 256;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_backoff_order() {
        let mut config = valid_config();
        config.crawler.backoff_initial = 5000;
        config.crawler.backoff_max = 100;
        assert!(validate(&config).is_err());
    }
}
