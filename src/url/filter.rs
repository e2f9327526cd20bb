use crate::UrlError;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// File extensions that never lead to crawlable HTML
const BLOCKED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpe?g", "ico", "png", "tiff?", "mid", "mp2", "mp3", "mp4",
    "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps", "tex",
    "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2", "tar",
    "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx", "mso",
    "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

fn extension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(r"(?i)\.({})$", BLOCKED_EXTENSIONS.join("|"));
        Regex::new(&pattern).expect("extension denylist compiles")
    })
}

/// Checks whether a parsed URL is worth fetching at all
///
/// Only `http` and `https` URLs with a host pass, and the path must not end in
/// a binary, media, or document extension (case-insensitive).
pub fn is_fetchable_url(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    if url.host_str().is_none() {
        return false;
    }

    !extension_pattern().is_match(url.path())
}

/// Checks whether a raw URL string is worth fetching
///
/// Fails closed: a string that cannot be parsed is reported as
/// `UrlError::Parse` rather than treated as fetchable.
///
/// # Examples
///
/// ```
/// use polite_frontier::url::is_fetchable;
///
/// assert!(is_fetchable("http://x/page.html").unwrap());
/// assert!(!is_fetchable("http://x/doc.pdf").unwrap());
/// assert!(is_fetchable("::not a url::").is_err());
/// ```
pub fn is_fetchable(raw: &str) -> Result<bool, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    Ok(is_fetchable_url(&url))
}

/// Explains why a URL is not fetchable, for logging
pub fn unfetchable_reason(url: &Url) -> Option<UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Some(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Some(UrlError::MissingDomain);
    }
    None
}
