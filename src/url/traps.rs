//! Crawler-trap heuristics applied when a URL is offered to the frontier
//!
//! Two independent checks guard against unbounded crawl work:
//! - path depth: too many `/`-separated segments means a likely recursive
//!   directory trap
//! - query variants: each query-stripped base URL may only spawn a bounded
//!   number of distinct query-bearing variants

use crate::url::normalize::strip_query;
use std::collections::HashMap;
use url::Url;

/// Limits applied by the trap heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapPolicy {
    /// Maximum number of path segments
    pub depth_limit: usize,

    /// Maximum accepted query variants per base URL
    pub query_limit: u32,
}

/// Outcome of the admissibility checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    TooDeep,
    QueryLimit,
}

/// Counts accepted query-bearing variants per base URL
///
/// Owned by a single frontier instance; never persisted, rebuilt from the
/// ledger during recovery. A count never exceeds the policy's query limit.
#[derive(Debug, Default)]
pub struct QueryCounts {
    counts: HashMap<String, u32>,
}

impl QueryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while `base` has fewer than `limit` counted variants
    pub fn has_room(&self, base: &Url, limit: u32) -> bool {
        self.count(base) < limit
    }

    /// Counts one more variant of `base`
    pub fn record(&mut self, base: &Url) {
        *self.counts.entry(base.as_str().to_string()).or_insert(0) += 1;
    }

    /// Counts one more variant of `base` unless the limit is already reached
    ///
    /// Returns true and increments when the pre-increment count is below
    /// `limit`; returns false and leaves the count untouched otherwise.
    pub fn try_admit(&mut self, base: &Url, limit: u32) -> bool {
        if !self.has_room(base, limit) {
            return false;
        }
        self.record(base);
        true
    }

    /// Current variant count for a base URL
    pub fn count(&self, base: &Url) -> u32 {
        self.counts.get(base.as_str()).copied().unwrap_or(0)
    }

    /// Number of base URLs that have at least one counted variant
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Number of `/`-separated segments in the URL path
///
/// `/a/b/c` has depth 3, `/` has depth 0. Empty interior segments count, so
/// `/a//b` has depth 3 and a run of slashes cannot hide a deep path.
pub fn path_depth(url: &Url) -> usize {
    let path = url.path();
    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.is_empty() {
        0
    } else {
        rest.split('/').count()
    }
}

/// Returns true when the URL carries a non-empty query string
pub fn has_query(url: &Url) -> bool {
    url.query().map(|q| !q.is_empty()).unwrap_or(false)
}

/// Frontier state the trap heuristics need while deciding on one URL
///
/// The query heuristic has a side effect: the query-stripped base URL is
/// offered to the frontier as its own candidate. Implementors perform that
/// admission synchronously and expose the variant counter.
pub trait TrapContext {
    type Error;

    /// Offers the query-stripped base URL as a separate candidate
    fn admit_base(&mut self, base: &Url) -> Result<(), Self::Error>;

    /// The variant counter consulted by the query heuristic
    fn query_counts(&mut self) -> &mut QueryCounts;
}

impl TrapPolicy {
    /// Depth heuristic alone
    pub fn within_depth(&self, url: &Url) -> bool {
        path_depth(url) <= self.depth_limit
    }

    /// Runs both trap heuristics against a canonical URL
    ///
    /// For a query-bearing URL the base URL is admitted through `ctx` before
    /// the query limit is consulted, whether or not the variant ends up
    /// admitted. This keeps the base page reachable no matter how many
    /// variants get rejected. An error from `admit_base` aborts the check.
    ///
    /// The variant counter is only read here. The caller records an admitted
    /// variant with `QueryCounts::record` once it is durably stored.
    pub fn check<C: TrapContext>(&self, url: &Url, ctx: &mut C) -> Result<Admission, C::Error> {
        if !self.within_depth(url) {
            return Ok(Admission::TooDeep);
        }

        if has_query(url) {
            let base = strip_query(url);
            ctx.admit_base(&base)?;

            if !ctx.query_counts().has_room(&base, self.query_limit) {
                return Ok(Admission::QueryLimit);
            }
        }

        Ok(Admission::Admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(depth_limit: usize, query_limit: u32) -> TrapPolicy {
        TrapPolicy {
            depth_limit,
            query_limit,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    /// Records offered base URLs instead of touching a ledger
    #[derive(Default)]
    struct Recorder {
        counts: QueryCounts,
        bases: Vec<String>,
        fail: bool,
    }

    impl TrapContext for Recorder {
        type Error = &'static str;

        fn admit_base(&mut self, base: &Url) -> Result<(), Self::Error> {
            if self.fail {
                return Err("ledger down");
            }
            self.bases.push(base.to_string());
            Ok(())
        }

        fn query_counts(&mut self) -> &mut QueryCounts {
            &mut self.counts
        }
    }

    fn check(p: &TrapPolicy, u: &str, ctx: &mut Recorder) -> Admission {
        p.check(&url(u), ctx).unwrap()
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth(&url("http://x/")), 0);
        assert_eq!(path_depth(&url("http://x/a")), 1);
        assert_eq!(path_depth(&url("http://x/a/b/c")), 3);
        assert_eq!(path_depth(&url("http://x/a/b/c/d")), 4);
    }

    #[test]
    fn test_path_depth_counts_empty_segments() {
        assert_eq!(path_depth(&url("http://x/a//b")), 3);
        assert_eq!(path_depth(&url("http://x//")), 2);

        let slashes = "/".repeat(30);
        let trap = url(&format!("http://x/a{}b", slashes));
        assert_eq!(path_depth(&trap), 31);
        let mut ctx = Recorder::default();
        assert_eq!(check(&policy(3, 40), trap.as_str(), &mut ctx), Admission::TooDeep);
    }

    #[test]
    fn test_depth_limit() {
        let p = policy(3, 40);
        let mut ctx = Recorder::default();
        assert_eq!(check(&p, "http://x/a/b/c", &mut ctx), Admission::Admitted);
        assert_eq!(check(&p, "http://x/a/b/c/d", &mut ctx), Admission::TooDeep);
    }

    #[test]
    fn test_query_limit() {
        let p = policy(15, 2);
        let mut ctx = Recorder::default();
        let base = url("http://x/p");

        assert_eq!(check(&p, "http://x/p?a=1", &mut ctx), Admission::Admitted);
        assert_eq!(ctx.bases, vec!["http://x/p".to_string()]);
        ctx.counts.record(&base);

        assert_eq!(check(&p, "http://x/p?a=2", &mut ctx), Admission::Admitted);
        ctx.counts.record(&base);

        assert_eq!(check(&p, "http://x/p?a=3", &mut ctx), Admission::QueryLimit);
        assert_eq!(ctx.counts.count(&base), 2);
    }

    #[test]
    fn test_check_does_not_count_variant() {
        let p = policy(15, 1);
        let mut ctx = Recorder::default();

        assert_eq!(check(&p, "http://x/p?a=1", &mut ctx), Admission::Admitted);
        assert_eq!(check(&p, "http://x/p?a=1", &mut ctx), Admission::Admitted);
        assert_eq!(ctx.counts.count(&url("http://x/p")), 0);
    }

    #[test]
    fn test_base_admitted_even_when_variant_rejected() {
        let p = policy(15, 0);
        let mut ctx = Recorder::default();
        assert_eq!(check(&p, "http://x/p?a=1", &mut ctx), Admission::QueryLimit);
        assert_eq!(ctx.bases, vec!["http://x/p".to_string()]);
    }

    #[test]
    fn test_plain_url_skips_query_heuristic() {
        let p = policy(15, 0);
        let mut ctx = Recorder::default();
        assert_eq!(check(&p, "http://x/p", &mut ctx), Admission::Admitted);
        assert!(ctx.bases.is_empty());
        assert!(ctx.counts.is_empty());
    }

    #[test]
    fn test_too_deep_does_not_consume_query_slot() {
        let p = policy(1, 1);
        let mut ctx = Recorder::default();
        assert_eq!(check(&p, "http://x/a/b?q=1", &mut ctx), Admission::TooDeep);
        assert_eq!(ctx.counts.count(&url("http://x/a/b")), 0);
        assert!(ctx.bases.is_empty());
    }

    #[test]
    fn test_base_error_propagates() {
        let p = policy(15, 5);
        let mut ctx = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let result = p.check(&url("http://x/p?a=1"), &mut ctx);
        assert_eq!(result, Err("ledger down"));
        assert_eq!(ctx.counts.count(&url("http://x/p")), 0);
    }

    #[test]
    fn test_counts_are_per_base() {
        let mut counts = QueryCounts::new();
        assert!(counts.try_admit(&url("http://x/a"), 1));
        assert!(counts.try_admit(&url("http://x/b"), 1));
        assert!(!counts.try_admit(&url("http://x/a"), 1));
        assert_eq!(counts.len(), 2);
    }
}
