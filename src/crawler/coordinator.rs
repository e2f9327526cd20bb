//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives the frontier with a pool of
//! concurrent workers, including:
//! - Spawning worker tasks that share one frontier
//! - Fetching pages and feeding extracted links back into the frontier
//! - Backing off when politeness leaves nothing eligible
//! - Deciding jointly when the crawl is finished

use crate::config::{Config, CrawlerConfig};
use crate::crawler::backoff::Backoff;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{Extractor, HtmlExtractor};
use crate::{FrontierError, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Totals reported at the end of a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages fetched with status 200
    pub fetched: u64,

    /// Pages that failed or returned another status
    pub failed: u64,

    /// URLs added to the ledger during the run
    pub discovered: u64,
}

/// Counters shared by all workers of one run
#[derive(Debug, Default)]
struct Progress {
    /// Workers between `next_url` and `mark_complete`
    in_flight: AtomicUsize,
    fetched: AtomicU64,
    failed: AtomicU64,
}

impl Progress {
    fn summary(&self, discovered: u64) -> CrawlSummary {
        CrawlSummary {
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discovered,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F: Fetcher, E: Extractor> {
    frontier: Arc<Frontier>,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    config: CrawlerConfig,
}

impl<F: Fetcher, E: Extractor> Coordinator<F, E> {
    pub fn new(frontier: Arc<Frontier>, fetcher: F, extractor: E, config: CrawlerConfig) -> Self {
        Self {
            frontier,
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            config,
        }
    }

    /// Runs workers until the frontier is exhausted
    ///
    /// Each worker repeatedly:
    /// 1. Takes the next eligible URL, or backs off if there is none
    /// 2. Fetches it
    /// 3. Adds every extracted link (200 responses only)
    /// 4. Marks the URL complete, whatever the fetch outcome
    ///
    /// A worker exits once nothing is queued and no other worker holds a URL,
    /// since only an in-flight URL can still produce new work.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - All workers finished
    /// * `Err(FrontierError)` - A ledger write failed; remaining workers are
    ///   aborted so the ledger stays the last consistent record
    pub async fn run(&self) -> Result<CrawlSummary> {
        let workers = self.config.workers.max(1);
        tracing::info!(
            "Starting crawl with {} workers, {} URLs pending",
            workers,
            self.frontier.pending()
        );

        let start_time = Instant::now();
        let known_before = self.frontier.stats()?.total;
        let progress = Arc::new(Progress::default());
        let mut tasks = JoinSet::new();

        for id in 0..workers {
            tasks.spawn(worker(
                id,
                Arc::clone(&self.frontier),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                Arc::clone(&progress),
                Backoff::new(
                    Duration::from_millis(self.config.backoff_initial),
                    Duration::from_millis(self.config.backoff_max),
                ),
            ));
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            let error = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => FrontierError::Worker(e.to_string()),
            };

            tracing::error!("Worker failed: {}", error);
            if failure.is_none() {
                tasks.abort_all();
                failure = Some(error);
            }
        }

        if let Some(error) = failure {
            return Err(error);
        }

        let known_after = self.frontier.stats()?.total;
        let summary = progress.summary(known_after.saturating_sub(known_before));
        tracing::info!(
            "Crawl completed in {:?}: {} fetched, {} failed, {} discovered",
            start_time.elapsed(),
            summary.fetched,
            summary.failed,
            summary.discovered
        );

        Ok(summary)
    }
}

/// One crawl worker
async fn worker<F: Fetcher, E: Extractor>(
    id: usize,
    frontier: Arc<Frontier>,
    fetcher: Arc<F>,
    extractor: Arc<E>,
    progress: Arc<Progress>,
    mut backoff: Backoff,
) -> Result<()> {
    tracing::debug!("Worker {} started", id);

    loop {
        // Counted before dequeue so other workers never see a URL vanish
        // without an in-flight worker holding it
        progress.in_flight.fetch_add(1, Ordering::SeqCst);

        let Some(url) = frontier.next_url() else {
            let others = progress.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;

            if others == 0
                && frontier.pending() == 0
                && frontier.is_exhausted()
                && progress.in_flight.load(Ordering::SeqCst) == 0
            {
                break;
            }

            let mut delay = backoff.next_delay();
            if let Some(wait) = frontier.time_until_eligible() {
                if !wait.is_zero() {
                    delay = delay.min(wait);
                }
            }
            tracing::trace!("Worker {} idle, sleeping {:?}", id, delay);
            tokio::time::sleep(delay).await;
            continue;
        };

        backoff.reset();
        let result = process_url(&url, &frontier, &*fetcher, &*extractor, &progress).await;
        progress.in_flight.fetch_sub(1, Ordering::SeqCst);
        result?;
    }

    tracing::debug!("Worker {} finished", id);
    Ok(())
}

/// Fetches one URL, feeds its links to the frontier and completes it
async fn process_url<F: Fetcher, E: Extractor>(
    url: &str,
    frontier: &Frontier,
    fetcher: &F,
    extractor: &E,
    progress: &Progress,
) -> Result<()> {
    tracing::debug!("Fetching {}", url);
    let response = fetcher.fetch(url).await;

    match response.content.as_deref() {
        Some(content) if response.status == 200 => {
            progress.fetched.fetch_add(1, Ordering::Relaxed);

            let links = extractor.extract(&response.url, content);
            let mut added = 0;
            for link in &links {
                if frontier.add_url(link)?.is_added() {
                    added += 1;
                }
            }

            tracing::info!(
                "Fetched {} ({} links, {} new, {} pending)",
                url,
                links.len(),
                added,
                frontier.pending()
            );
        }
        _ => {
            progress.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Failed {}: status {} {}",
                url,
                response.status,
                response.error.as_deref().unwrap_or("")
            );
        }
    }

    frontier.mark_complete(url)?;
    Ok(())
}

/// Runs a complete crawl from a loaded configuration
///
/// This is the entry point used by the binary:
/// 1. Open (or recreate) the ledger and recover the frontier
/// 2. Build the HTTP fetcher
/// 3. Run the workers until the frontier is exhausted
/// 4. Close the ledger
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `force_restart` - Discard any previous crawl instead of resuming it
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished
/// * `Err(FrontierError)` - Crawl failed with an error
pub async fn run_crawl(config: Config, force_restart: bool) -> Result<CrawlSummary> {
    let frontier = Arc::new(Frontier::open(config.frontier.clone(), force_restart)?);
    tracing::info!("Frontier ready: {}", frontier.stats()?);

    let fetcher = HttpFetcher::new(&config.crawler)?;
    let coordinator = Coordinator::new(
        Arc::clone(&frontier),
        fetcher,
        HtmlExtractor::new(),
        config.crawler.clone(),
    );
    let summary = coordinator.run().await?;
    drop(coordinator);

    match Arc::try_unwrap(frontier) {
        Ok(frontier) => frontier.close()?,
        Err(_) => tracing::warn!("Frontier still shared at shutdown, ledger not closed explicitly"),
    }

    Ok(summary)
}
