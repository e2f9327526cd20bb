//! Polite-Frontier main entry point
//!
//! This is the command-line interface for running a crawl over the frontier.

use anyhow::Context;
use clap::Parser;
use polite_frontier::config::{load_config_with_hash, Config};
use polite_frontier::crawler::run_crawl;
use polite_frontier::storage::{open_ledger, Ledger, META_CREATED_AT, META_SHARD_COUNT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Polite-Frontier: a resumable, politeness-aware web crawler
///
/// Crawls from a set of seed URLs, never fetching a page twice, keeping a
/// minimum delay between requests to the same site and avoiding query and
/// directory traps. Progress is stored in a ledger file so an interrupted
/// crawl picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "polite-frontier")]
#[command(version)]
#[command(about = "A resumable, politeness-aware web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the existing ledger (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Delete the existing ledger and start from the seed URLs
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show record counts from the ledger and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polite_frontier=info,warn"),
            1 => EnvFilter::new("polite_frontier=debug,info"),
            2 => EnvFilter::new("polite_frontier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the validated configuration
fn handle_dry_run(config: &Config) {
    let frontier = &config.frontier;
    let crawler = &config.crawler;

    println!("=== Polite-Frontier Dry Run ===\n");

    println!("Frontier:");
    println!("  Ledger: {}", frontier.save_file.display());
    println!("  Shards: {}", frontier.shard_count);
    println!("  Per-shard delay: {}ms", frontier.time_delay);
    println!("  Query limit: {}", frontier.query_limit);
    println!("  Depth limit: {}", frontier.depth_limit);

    println!("\nCrawler:");
    println!("  Workers: {}", crawler.workers);
    println!("  User agent: {}", crawler.user_agent);
    println!("  Request timeout: {}s", crawler.request_timeout);
    println!(
        "  Idle backoff: {}ms..{}ms",
        crawler.backoff_initial, crawler.backoff_max
    );

    println!("\nSeed URLs ({}):", frontier.seed_urls.len());
    for seed in &frontier.seed_urls {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows record counts from the ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = &config.frontier.save_file;
    println!("Ledger: {}\n", path.display());

    let ledger = open_ledger(path, false)
        .with_context(|| format!("Failed to open ledger {}", path.display()))?;
    let stats = ledger.stats()?;

    if let Some(created) = ledger.get_meta(META_CREATED_AT)? {
        println!("Created:     {}", created);
    }
    if let Some(shards) = ledger.get_meta(META_SHARD_COUNT)? {
        println!("Shard count: {}", shards);
    }
    println!("Discovered:  {}", stats.total);
    println!("Completed:   {}", stats.completed);
    println!("Pending:     {}", stats.pending());

    ledger.close()?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume from ledger if present)");
    }
    tracing::info!("Seed URLs: {}", config.frontier.seed_urls.len());

    match run_crawl(config, fresh).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed successfully: {} fetched, {} failed, {} discovered",
                summary.fetched,
                summary.failed,
                summary.discovered
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
