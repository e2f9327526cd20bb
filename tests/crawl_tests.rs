//! Integration tests for the crawl loop
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch / extract / add / complete cycle end-to-end.

use polite_frontier::config::{Config, CrawlerConfig, FrontierConfig};
use polite_frontier::crawler::{run_crawl, Coordinator, HtmlExtractor, HttpFetcher};
use polite_frontier::storage::{open_ledger, Ledger};
use polite_frontier::Frontier;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `seed` into `db_path`
fn create_test_config(seed: String, db_path: &Path) -> Config {
    let mut frontier = FrontierConfig::with_seeds(vec![seed], db_path);
    frontier.time_delay = 5; // Very short for testing
    frontier.shard_count = 4;

    Config {
        frontier,
        crawler: CrawlerConfig {
            workers: 3,
            user_agent: "TestBot/1.0".to_string(),
            request_timeout: 5,
            backoff_initial: 1,
            backoff_max: 20,
        },
    }
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><body>
            <a href="{0}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="/report.pdf">Report</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><body><a href="/page2">again</a><a href="/">home</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><body><a href="/gone">dead link</a></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");
    let config = create_test_config(format!("{}/", base_url), &db_path);

    let summary = run_crawl(config, true).await.expect("Crawl failed");

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.discovered, 3);

    // No URL fetched twice
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);

    let ledger = open_ledger(&db_path, false).unwrap();
    let stats = ledger.stats().unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 4);
}

#[tokio::test]
async fn test_resume_after_finished_crawl_does_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><a href="/only">only</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/only", "<html></html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");
    let config = create_test_config(format!("{}/", base_url), &db_path);

    let first = run_crawl(config.clone(), true).await.unwrap();
    assert_eq!(first.fetched, 2);

    let second = run_crawl(config, false).await.unwrap();
    assert_eq!(second.fetched, 0);
    assert_eq!(second.failed, 0);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_query_trap_is_bounded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..20)
        .map(|n| format!(r#"<a href="/list?page={}">{}</a>"#, n, n))
        .collect();
    mount_page(&mock_server, "/", format!("<html><body>{}</body></html>", links)).await;
    // Matches /list with any query
    mount_page(&mock_server, "/list", "<html></html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(format!("{}/", base_url), &dir.path().join("trap.db"));
    config.frontier.query_limit = 3;

    let frontier = Arc::new(Frontier::open(config.frontier.clone(), true).unwrap());
    let coordinator = Coordinator::new(
        Arc::clone(&frontier),
        HttpFetcher::new(&config.crawler).unwrap(),
        HtmlExtractor::new(),
        config.crawler.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    // The seed, the query-stripped base and three variants
    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.discovered, 4);
    assert_eq!(frontier.stats().unwrap().total, 5);
}
