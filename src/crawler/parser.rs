//! Link extraction from fetched pages
//!
//! The crawl loop only needs candidate URLs out of a page; everything else in
//! the document is ignored.

use scraper::{Html, Selector};
use url::Url;

/// Turns fetched content into candidate absolute URLs
pub trait Extractor: Send + Sync + 'static {
    fn extract(&self, page_url: &str, content: &str) -> Vec<String>;
}

/// `Extractor` for HTML documents
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to http(s)
///
/// Filtering by extension, depth and query is left to the frontier.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, page_url: &str, content: &str) -> Vec<String> {
        let base_url = match Url::parse(page_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot resolve links against {}: {}", page_url, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(content);
        extract_links(&document, &base_url)
    }
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
