//! Scheduler for the sharded crawl frontier
//!
//! This module handles:
//! - A fixed pool of domain-bucket FIFO queues (shards)
//! - Round-robin selection across shards with a persisted cursor
//! - Respecting a minimum delay between dequeues from the same shard
//! - An approximate pending count used as a liveness hint

use crate::state::Shard;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Locks a mutex, recovering the guard if a previous holder panicked
///
/// Every critical section in the frontier leaves its data consistent before
/// doing anything that can fail, so a poisoned guard is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scheduler hands out URLs fairly across shards
///
/// The scheduler coordinates:
/// - Per-shard FIFO order (insertion order within a shard)
/// - Per-shard politeness (minimum time between dequeues)
/// - Round-robin fairness (a rotating cursor that survives between calls)
///
/// Each shard has its own lock, taken by both enqueue and dequeue. The cursor
/// has a separate lock held for the duration of one `next_url` scan, so
/// concurrent dequeues are serialized while enqueues only contend on the
/// single shard they touch.
pub struct Scheduler {
    /// Domain-bucket queues
    shards: Vec<Mutex<Shard>>,

    /// Index of the first shard the next scan looks at
    cursor: Mutex<usize>,

    /// Approximate number of queued URLs across all shards
    pending: AtomicUsize,

    /// Minimum time between two dequeues from the same shard
    time_delay: Duration,
}

impl Scheduler {
    /// Creates a scheduler with `shard_count` empty shards (at least one)
    pub fn new(shard_count: usize, time_delay: Duration) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| Mutex::new(Shard::new()))
            .collect();

        Self {
            shards,
            cursor: Mutex::new(0),
            pending: AtomicUsize::new(0),
            time_delay,
        }
    }

    /// Appends a URL to the back of a shard
    ///
    /// `index` is reduced modulo the shard count.
    pub fn enqueue(&self, index: usize, url: String) {
        let index = index % self.shards.len();
        let mut shard = lock(&self.shards[index]);
        shard.push(url);
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Gets the next URL that may be fetched at `now`
    ///
    /// This method:
    /// 1. Scans shards in round-robin order starting at the cursor
    /// 2. Takes the front URL of the first eligible shard and stamps its
    ///    dequeue time
    /// 3. Moves the cursor past the shard it served, or one step forward if
    ///    nothing was eligible
    ///
    /// # Returns
    ///
    /// * `Some(String)` - A URL that is ready to fetch
    /// * `None` - No shard is eligible right now; this does not mean the
    ///   frontier is empty, callers should back off and retry
    pub fn next_url(&self, now: Instant) -> Option<String> {
        let mut cursor = lock(&self.cursor);
        let count = self.shards.len();
        let start = *cursor % count;

        for offset in 0..count {
            let index = (start + offset) % count;
            let mut shard = lock(&self.shards[index]);

            let eligible = shard.is_eligible(self.time_delay, now);
            tracing::trace!(
                "Checking shard {} ({} queued): eligible={}",
                index,
                shard.len(),
                eligible
            );

            if !eligible {
                continue;
            }

            if let Some(url) = shard.pop(now) {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                *cursor = (index + 1) % count;
                tracing::debug!("Dequeued {} from shard {}", url, index);
                return Some(url);
            }
        }

        *cursor = (start + 1) % count;
        None
    }

    /// Calculates the minimum time until some shard becomes eligible
    ///
    /// Returns None when every shard is empty. Useful as an upper bound for a
    /// caller's backoff sleep.
    pub fn time_until_eligible(&self, now: Instant) -> Option<Duration> {
        self.shards
            .iter()
            .filter_map(|shard| lock(shard).time_until_eligible(self.time_delay, now))
            .min()
    }

    /// Approximate number of queued URLs
    ///
    /// A hint only; use `is_empty` before acting on a zero.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Checks actual shard occupancy
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| lock(shard).is_empty())
    }

    /// Number of URLs queued in one shard
    pub fn shard_len(&self, index: usize) -> usize {
        lock(&self.shards[index % self.shards.len()]).len()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn time_delay(&self) -> Duration {
        self.time_delay
    }
}
