use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use url::Url;

/// Rightmost `label.label.label` run at the end of a host
fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9-]+\.[A-Za-z0-9-]+\.[A-Za-z0-9-]+$")
            .expect("static suffix pattern is valid")
    })
}

/// Extracts the domain from a URL
///
/// Retrieves the host portion of a URL in lowercase. Returns None for URLs
/// without a host (e.g. `mailto:`).
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Approximates the registrable domain of a host
///
/// Matches the last three dot-separated labels of the host, which keeps
/// `www.ics.uci.edu` and `vision.ics.uci.edu` together under `ics.uci.edu`.
/// This is a coarse heuristic, not a public-suffix lookup: hosts with fewer
/// than three labels are returned whole. A trailing root dot is ignored, so
/// `www.ics.uci.edu.` maps to the same domain as `www.ics.uci.edu`.
///
/// # Examples
///
/// ```
/// use polite_frontier::url::registrable_domain;
///
/// assert_eq!(registrable_domain("www.ics.uci.edu"), "ics.uci.edu");
/// assert_eq!(registrable_domain("example.com"), "example.com");
/// ```
pub fn registrable_domain(host: &str) -> &str {
    let host = host.trim_end_matches('.');
    suffix_pattern()
        .find(host)
        .map(|m| m.as_str())
        .unwrap_or(host)
}

/// Chooses the shard a URL belongs to
///
/// Hashes the registrable-domain approximation of the host with SHA-256 and
/// reduces the first eight bytes modulo `shard_count`. URLs without a host hash
/// the empty string. Deterministic across processes, so recovery can recompute
/// the assignment instead of persisting it.
pub fn domain_bucket(url: &Url, shard_count: usize) -> usize {
    if shard_count <= 1 {
        return 0;
    }

    let host = extract_domain(url).unwrap_or_default();
    let key = registrable_domain(&host);

    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);

    (u64::from_be_bytes(prefix) % shard_count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://EXAMPLE.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_without_host() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(extract_domain(&url), None);
    }

    #[test]
    fn test_registrable_domain_three_labels() {
        assert_eq!(registrable_domain("ics.uci.edu"), "ics.uci.edu");
        assert_eq!(registrable_domain("www.ics.uci.edu"), "ics.uci.edu");
        assert_eq!(registrable_domain("a.b.www.ics.uci.edu"), "ics.uci.edu");
    }

    #[test]
    fn test_registrable_domain_falls_back_to_host() {
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("localhost"), "localhost");
    }

    #[test]
    fn test_registrable_domain_ignores_root_dot() {
        assert_eq!(registrable_domain("www.ics.uci.edu."), "ics.uci.edu");
        assert_eq!(registrable_domain("example.com."), "example.com");
    }

    #[test]
    fn test_root_dot_shares_bucket() {
        let a = Url::parse("http://www.ics.uci.edu./about").unwrap();
        let b = Url::parse("http://www.ics.uci.edu/about").unwrap();
        assert_eq!(domain_bucket(&a, 20), domain_bucket(&b, 20));
    }

    #[test]
    fn test_subdomains_share_bucket() {
        let a = Url::parse("https://www.ics.uci.edu/about").unwrap();
        let b = Url::parse("http://vision.ics.uci.edu/people?x=1").unwrap();
        assert_eq!(domain_bucket(&a, 20), domain_bucket(&b, 20));
    }

    #[test]
    fn test_bucket_in_range_and_stable() {
        for host in ["a.com", "b.org", "c.d.e.net", "127.0.0.1", "x"] {
            let url = Url::parse(&format!("http://{}/", host)).unwrap();
            let bucket = domain_bucket(&url, 7);
            assert!(bucket < 7);
            assert_eq!(bucket, domain_bucket(&url, 7));
        }
    }

    #[test]
    fn test_single_shard() {
        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(domain_bucket(&url, 1), 0);
        assert_eq!(domain_bucket(&url, 0), 0);
    }

    #[test]
    fn test_buckets_spread_across_hosts() {
        let buckets: std::collections::HashSet<usize> = (0..64)
            .map(|i| {
                let url = Url::parse(&format!("http://site{}.com/", i)).unwrap();
                domain_bucket(&url, 4)
            })
            .collect();
        assert!(buckets.len() > 1);
    }
}
