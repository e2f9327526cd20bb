//! Frontier orchestrator
//!
//! Composes the ledger, the URL validator and the scheduler into the public
//! contract used by fetch workers:
//! - `add_url` admits a discovered URL at most once
//! - `next_url` hands out the next URL that politeness allows
//! - `mark_complete` durably records that a URL has been handled
//!
//! Construction rebuilds every shard from the ledger, so a crashed crawl
//! resumes with exactly the URLs that were discovered but never completed.

use crate::config::FrontierConfig;
use crate::crawler::scheduler::{lock, Scheduler};
use crate::state::UrlRecord;
use crate::storage::{open_ledger, Ledger, LedgerStats, SqliteLedger, META_SHARD_COUNT};
use crate::url::{
    dedup_key, domain_bucket, has_query, is_fetchable_url, normalize_url, strip_query,
    unfetchable_reason, Admission, QueryCounts, TrapContext, TrapPolicy,
};
use crate::{FrontierError, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// Why `add_url` refused a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The string is not a valid absolute URL
    Unparseable,

    /// Wrong scheme, no host, or a blocked file extension
    NotFetchable,

    /// Path has more segments than the depth limit
    TooDeep,

    /// Too many query variants of the same base URL
    QueryLimit,
}

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Recorded in the ledger and queued in its shard
    Added,

    /// Already in the ledger; nothing changed
    AlreadySeen,

    /// Refused by a filter or trap heuristic; nothing changed
    Rejected(Rejection),
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added)
    }
}

/// State guarded by the frontier's global write lock
struct LedgerState {
    ledger: SqliteLedger,
    query_counts: QueryCounts,
}

/// Summary of a startup recovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Recovery {
    restored: usize,
    completed: usize,
    skipped: usize,
}

/// The crawl frontier
///
/// All ledger mutations, and the query-variant counter, sit behind one lock so
/// that a dedup check and the write it guards cannot interleave with another
/// caller's. Shards have their own locks inside the scheduler, so `next_url`
/// never waits on ledger I/O.
pub struct Frontier {
    config: FrontierConfig,
    policy: TrapPolicy,
    state: Mutex<LedgerState>,
    scheduler: Scheduler,
}

impl Frontier {
    /// Opens the ledger at `config.save_file` and builds the frontier from it
    ///
    /// # Arguments
    ///
    /// * `config` - Frontier policy and ledger location
    /// * `force_restart` - Discard any previous crawl stored at `save_file`
    ///
    /// # Returns
    ///
    /// * `Ok(Frontier)` - Recovered or freshly seeded frontier
    /// * `Err(FrontierError)` - The ledger could not be opened or read
    pub fn open(config: FrontierConfig, force_restart: bool) -> Result<Self> {
        let ledger = open_ledger(&config.save_file, force_restart)?;
        Self::with_ledger(config, ledger)
    }

    /// Builds the frontier on top of an already opened ledger
    ///
    /// Every incomplete record is pushed back into its shard. If the ledger
    /// holds nothing at all, the configured seeds are added instead.
    pub fn with_ledger(config: FrontierConfig, mut ledger: SqliteLedger) -> Result<Self> {
        let shard_count = config.shard_count.max(1);

        match ledger.get_meta(META_SHARD_COUNT)? {
            Some(stored) if stored != shard_count.to_string() => {
                tracing::warn!(
                    "Ledger was created with shard-count {}, now using {}; shards are recomputed",
                    stored,
                    shard_count
                );
            }
            _ => {}
        }
        ledger.set_meta(META_SHARD_COUNT, &shard_count.to_string())?;

        let frontier = Self {
            policy: TrapPolicy {
                depth_limit: config.depth_limit,
                query_limit: config.query_limit,
            },
            scheduler: Scheduler::new(shard_count, config.time_delay()),
            state: Mutex::new(LedgerState {
                ledger,
                query_counts: QueryCounts::new(),
            }),
            config,
        };

        let recovery = frontier.recover()?;
        if recovery.restored + recovery.completed + recovery.skipped > 0 {
            tracing::info!(
                "Recovered {} pending URLs ({} completed, {} no longer admissible)",
                recovery.restored,
                recovery.completed,
                recovery.skipped
            );
        } else {
            frontier.seed()?;
        }

        Ok(frontier)
    }

    /// Offers a URL to the frontier
    ///
    /// The URL is normalized, checked against the ledger, filtered, and run
    /// through the trap heuristics. If admitted it is written to the ledger and
    /// appended to its shard before any other caller can observe either.
    ///
    /// Invalid or unwanted URLs are not errors; they come back as
    /// `AddOutcome::Rejected`. Only ledger failures return `Err`.
    pub fn add_url(&self, raw: &str) -> Result<AddOutcome> {
        let url = match normalize_url(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Dropping URL: {}", e);
                return Ok(AddOutcome::Rejected(Rejection::Unparseable));
            }
        };

        let mut state = lock(&self.state);
        self.add_locked(&mut state, &url)
    }

    /// Admission path shared by `add_url` and the query-base recursion
    fn add_locked(&self, state: &mut LedgerState, url: &Url) -> Result<AddOutcome> {
        let key = dedup_key(url);
        if state.ledger.contains(&key)? {
            return Ok(AddOutcome::AlreadySeen);
        }

        if !is_fetchable_url(url) {
            match unfetchable_reason(url) {
                Some(reason) => tracing::debug!("Not fetchable: {} ({})", url, reason),
                None => tracing::debug!("Not fetchable: {} (blocked extension)", url),
            }
            return Ok(AddOutcome::Rejected(Rejection::NotFetchable));
        }

        let admission = self.policy.check(
            url,
            &mut Admitter {
                frontier: self,
                state: &mut *state,
            },
        )?;

        match admission {
            Admission::Admitted => {}
            Admission::TooDeep => {
                tracing::debug!("Too deep (limit {}): {}", self.policy.depth_limit, url);
                return Ok(AddOutcome::Rejected(Rejection::TooDeep));
            }
            Admission::QueryLimit => {
                tracing::warn!(
                    "Query limit {} reached, rejecting {}",
                    self.policy.query_limit,
                    url
                );
                return Ok(AddOutcome::Rejected(Rejection::QueryLimit));
            }
        }

        // Ledger first: a failed write must not leave an unrecorded URL queued
        // or holding a query-variant slot
        state.ledger.put(&key, &UrlRecord::pending(url.as_str()))?;
        if has_query(url) {
            state.query_counts.record(&strip_query(url));
        }

        let shard = domain_bucket(url, self.scheduler.shard_count());
        self.scheduler.enqueue(shard, url.to_string());
        tracing::debug!("Added {} to shard {}", url, shard);

        Ok(AddOutcome::Added)
    }

    /// Gets the next URL a worker may fetch now
    ///
    /// `None` means nothing is eligible at this moment, not that the crawl is
    /// over. Callers back off and retry; see `is_exhausted`.
    pub fn next_url(&self) -> Option<String> {
        self.next_url_at(Instant::now())
    }

    /// Same as `next_url` with an explicit clock reading
    pub fn next_url_at(&self, now: Instant) -> Option<String> {
        self.scheduler.next_url(now)
    }

    /// Records that a worker is done with a URL
    ///
    /// Completing a URL that was never added is logged as an error, and the
    /// record is written anyway so progress is not lost.
    pub fn mark_complete(&self, raw: &str) -> Result<()> {
        let url = match normalize_url(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot mark unparseable URL complete: {}", e);
                return Ok(());
            }
        };

        let key = dedup_key(&url);
        let mut state = lock(&self.state);

        if !state.ledger.contains(&key)? {
            tracing::error!("Completed URL {} was never added to the frontier", url);
        }

        state.ledger.put(&key, &UrlRecord::completed(url.as_str()))?;
        tracing::debug!("Completed {}", url);
        Ok(())
    }

    /// Approximate number of URLs waiting in shards
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    /// Checks whether every shard is actually empty
    ///
    /// Unlike `pending`, this inspects each shard and may be used to decide
    /// that a crawl has finished.
    pub fn is_exhausted(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// Time until some shard becomes eligible, None if all are empty
    pub fn time_until_eligible(&self) -> Option<Duration> {
        self.scheduler.time_until_eligible(Instant::now())
    }

    /// Ledger record counts
    pub fn stats(&self) -> Result<LedgerStats> {
        Ok(lock(&self.state).ledger.stats()?)
    }

    pub fn shard_count(&self) -> usize {
        self.scheduler.shard_count()
    }

    /// Closes the ledger
    pub fn close(self) -> Result<()> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.ledger.close()?;
        Ok(())
    }

    /// Adds every configured seed URL
    fn seed(&self) -> Result<()> {
        tracing::info!("Seeding frontier with {} URLs", self.config.seed_urls.len());

        for seed in &self.config.seed_urls {
            let outcome = self.add_url(seed)?;
            if let AddOutcome::Rejected(reason) = outcome {
                tracing::warn!("Seed URL {} rejected: {:?}", seed, reason);
            }
        }

        Ok(())
    }

    /// Rebuilds shards and the query-variant counter from the ledger
    ///
    /// Records are replayed in insertion order so per-shard FIFO order matches
    /// discovery order. Completed records only feed the counter.
    /// Incomplete records are re-checked against the current policy and queued
    /// without the dedup step, since they are already in the ledger.
    fn recover(&self) -> Result<Recovery> {
        let mut state = lock(&self.state);
        let records = state.ledger.iterate()?;
        let mut recovery = Recovery::default();

        for (_, record) in records {
            let url = match Url::parse(&record.canonical_url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(
                        "Skipping unparseable ledger entry {}: {}",
                        record.canonical_url,
                        e
                    );
                    recovery.skipped += 1;
                    continue;
                }
            };

            if record.completed {
                if has_query(&url) {
                    state
                        .query_counts
                        .try_admit(&strip_query(&url), self.policy.query_limit);
                }
                recovery.completed += 1;
                continue;
            }

            if !is_fetchable_url(&url) || !self.policy.within_depth(&url) {
                tracing::debug!("Not requeueing {}: no longer admissible", url);
                recovery.skipped += 1;
                continue;
            }

            if has_query(&url)
                && !state
                    .query_counts
                    .try_admit(&strip_query(&url), self.policy.query_limit)
            {
                tracing::debug!("Not requeueing {}: query limit reached", url);
                recovery.skipped += 1;
                continue;
            }

            let shard = domain_bucket(&url, self.scheduler.shard_count());
            self.scheduler.enqueue(shard, url.to_string());
            recovery.restored += 1;
        }

        Ok(recovery)
    }
}

/// Trap-heuristic context backed by the locked frontier state
struct Admitter<'a> {
    frontier: &'a Frontier,
    state: &'a mut LedgerState,
}

impl TrapContext for Admitter<'_> {
    type Error = FrontierError;

    fn admit_base(&mut self, base: &Url) -> Result<()> {
        let outcome = self.frontier.add_locked(&mut *self.state, base)?;
        tracing::trace!("Query base {}: {:?}", base, outcome);
        Ok(())
    }

    fn query_counts(&mut self) -> &mut QueryCounts {
        &mut self.state.query_counts
    }
}
