/// A discovered URL as stored in the ledger
///
/// Keyed by the dedup key of `canonical_url`. `completed` only ever moves from
/// false to true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Normalized URL string
    pub canonical_url: String,

    /// Whether a worker has finished with this URL
    pub completed: bool,
}

impl UrlRecord {
    /// Record for a freshly discovered URL
    pub fn pending(canonical_url: impl Into<String>) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            completed: false,
        }
    }

    /// Record for a URL a worker has finished with
    pub fn completed(canonical_url: impl Into<String>) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            completed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let pending = UrlRecord::pending("http://x/");
        assert!(!pending.completed);
        assert_eq!(pending.canonical_url, "http://x/");

        let done = UrlRecord::completed("http://x/");
        assert!(done.completed);
    }
}
