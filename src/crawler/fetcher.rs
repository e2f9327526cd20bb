//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawl loop, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests to fetch page content
//! - Folding network failures into a plain response value

use crate::config::CrawlerConfig;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;

/// Outcome of fetching one URL
///
/// A fetch never fails as a Rust error: transport problems are reported with
/// `status == 0` and `error` set, so the crawl loop treats every outcome the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL of the final response (after redirects)
    pub url: String,

    /// HTTP status code, 0 if no response was received
    pub status: u16,

    /// Response body, if one could be read
    pub content: Option<String>,

    /// Description of what went wrong, if anything
    pub error: Option<String>,
}

impl FetchResponse {
    /// Response for a request that never produced an HTTP status
    pub fn network_error(url: &str, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status: 0,
            content: None,
            error: Some(error.into()),
        }
    }

    /// True for a 200 response with a body
    pub fn is_ok(&self) -> bool {
        self.status == 200 && self.content.is_some()
    }
}

/// Something that can download a URL
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchResponse> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawl loop configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

impl Fetcher for HttpFetcher {
    /// Fetches a URL with a single GET
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 200 | status 200, body in `content` |
    /// | Other HTTP status | that status, body if readable, `error` set |
    /// | Timeout | status 0, "Request timeout" |
    /// | Connection refused | status 0, "Connection refused" |
    /// | Other transport error | status 0, error text |
    async fn fetch(&self, url: &str) -> FetchResponse {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                return FetchResponse::network_error(url, error);
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        match response.text().await {
            Ok(body) => FetchResponse {
                url: final_url,
                status: status.as_u16(),
                content: Some(body),
                error: (!status.is_success()).then(|| format!("HTTP {}", status)),
            },
            Err(e) => FetchResponse {
                url: final_url,
                status: status.as_u16(),
                content: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&CrawlerConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_network_error_response() {
        let response = FetchResponse::network_error("http://x/", "boom");
        assert_eq!(response.status, 0);
        assert!(!response.is_ok());
        assert_eq!(response.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
        let response = fetcher.fetch(&format!("{}/page", server.uri())).await;

        assert!(response.is_ok());
        assert_eq!(response.content.as_deref(), Some("<html></html>"));
        assert_eq!(response.error, None);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
        let response = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
        let response = fetcher.fetch(&format!("http://127.0.0.1:{}/", port)).await;

        assert_eq!(response.status, 0);
        assert!(response.content.is_none());
        assert!(response.error.is_some());
    }
}
