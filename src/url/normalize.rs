use crate::UrlError;
use sha2::{Digest, Sha256};
use url::{Position, Url};

/// Normalizes a raw URL string into the canonical form tracked by the frontier
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace and parse; reject if malformed
/// 2. Lowercase scheme and host, resolve `.`/`..` segments (done by the parser)
/// 3. Remove fragment (everything after #)
/// 4. Remove trailing slash (except for root /)
/// 5. Remove empty query string (trailing ?)
///
/// Normalization is idempotent: feeding the output back in yields the same URL.
///
/// # Examples
///
/// ```
/// use polite_frontier::url::normalize_url;
///
/// let url = normalize_url("http://WWW.Example.COM/a/./b/#top").unwrap();
/// assert_eq!(url.as_str(), "http://www.example.com/a/b");
/// ```
pub fn normalize_url(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Derives the ledger dedup key of a canonical URL
///
/// The key is the hex SHA-256 of everything from the host through the query.
/// Scheme and fragment do not participate, so `http://` and `https://` forms of
/// the same page collapse onto one record.
pub fn dedup_key(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url[Position::BeforeHost..Position::AfterQuery].as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the URL with its query string removed
///
/// Used by the query-trap heuristic to find the "base" page that every query
/// variant hangs off.
pub fn strip_query(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base
}
