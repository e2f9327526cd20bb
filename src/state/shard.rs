use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One domain-bucket queue of the frontier
///
/// Holds not-yet-dequeued URLs in insertion order together with the time of
/// the last dequeue, which drives per-site politeness.
#[derive(Debug, Default)]
pub struct Shard {
    /// URLs waiting to be handed out, oldest first
    queue: VecDeque<String>,

    /// When a URL was last taken from this shard; None means never
    last_dequeue_time: Option<Instant>,
}

impl Shard {
    /// Creates an empty, immediately eligible shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL to the back of the queue
    pub fn push(&mut self, url: String) {
        self.queue.push_back(url);
    }

    /// Checks if a URL may be taken from this shard at `now`
    ///
    /// A shard is eligible when it is non-empty and either has never been
    /// dequeued from or at least `delay` has elapsed since the last dequeue.
    pub fn is_eligible(&self, delay: Duration, now: Instant) -> bool {
        if self.queue.is_empty() {
            return false;
        }

        match self.last_dequeue_time {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= delay,
        }
    }

    /// Pops the front URL and stamps the dequeue time
    ///
    /// Does not check eligibility; callers use `is_eligible` first.
    pub fn pop(&mut self, now: Instant) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.last_dequeue_time = Some(now);
        Some(url)
    }

    /// Calculates the time until this shard becomes eligible
    ///
    /// Returns None for an empty shard, `Duration::ZERO` if it is eligible now.
    pub fn time_until_eligible(&self, delay: Duration, now: Instant) -> Option<Duration> {
        if self.queue.is_empty() {
            return None;
        }

        let wait = self
            .last_dequeue_time
            .map(|last| delay.saturating_sub(now.saturating_duration_since(last)))
            .unwrap_or(Duration::ZERO);
        Some(wait)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn last_dequeue_time(&self) -> Option<Instant> {
        self.last_dequeue_time
    }
}
