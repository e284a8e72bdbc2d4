//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise
//! full crawls end-to-end: deduplication, scope filtering, redirect
//! handling, failure containment, and termination.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weft::config::CrawlConfig;
use weft::crawler::{CrawlReport, Crawler, PageResponse};
use weft::sink::{PageSink, SinkError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that records the final URL of every persisted page
#[derive(Clone)]
struct RecordingSink {
    pages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    fn new() -> Self {
        RecordingSink {
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn recorded(&self) -> Vec<String> {
        let mut pages = self.pages.lock().unwrap().clone();
        pages.sort();
        pages
    }
}

#[async_trait]
impl PageSink for RecordingSink {
    async fn persist(&self, page: &PageResponse) -> Result<(), SinkError> {
        self.pages.lock().unwrap().push(page.url.to_string());
        Ok(())
    }
}

/// Creates a crawl configuration rooted at the given mock server
fn create_test_config(server_uri: &str) -> CrawlConfig {
    let mut config = CrawlConfig::new(
        vec![format!("{}/", server_uri)],
        vec![server_uri.to_string()],
    );
    config.concurrency = 2;
    config.request_timeout_secs = 5.0;
    config
}

/// Mounts a 200 HTML page at `route`, expecting exactly `hits` fetches
async fn mount_html(server: &MockServer, route: &str, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .expect(hits)
        .mount(server)
        .await;
}

async fn run_crawler(crawler: &Crawler) -> CrawlReport {
    tokio::time::timeout(Duration::from_secs(10), crawler.run())
        .await
        .expect("crawl did not terminate")
        .expect("crawl returned an error")
}

#[tokio::test]
async fn test_each_page_is_fetched_exactly_once() {
    let server = MockServer::start().await;

    // Root links to p1 twice (once with a fragment) and to p2. The
    // expected call counts are verified when the server drops.
    mount_html(
        &server,
        "/",
        r#"<a href="/p1">one</a> <a href="/p2">two</a> <a href="/p1#frag">one again</a>"#,
        1,
    )
    .await;
    mount_html(&server, "/p1", "page one", 1).await;
    mount_html(&server, "/p2", "page two", 1).await;

    let sink = RecordingSink::new();
    let crawler = Crawler::builder(create_test_config(&server.uri()))
        .sink(sink.clone())
        .build()
        .await
        .unwrap();
    let report = run_crawler(&crawler).await;

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.urls_seen, 3);
    assert_eq!(report.fetch_failures, 0);
    assert_eq!(
        sink.recorded(),
        vec![
            format!("{}/", server.uri()),
            format!("{}/p1", server.uri()),
            format!("{}/p2", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_timeout_on_one_page_leaves_the_rest_crawled() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/p1">1</a> <a href="/p2">2</a>"#, 1).await;
    mount_html(&server, "/p1", "fast page", 1).await;

    // p2 answers long after the crawler has given up on it.
    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("slow page", "text/html")
                .set_delay(Duration::from_secs(30)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.request_timeout_secs = 0.5;

    let sink = RecordingSink::new();
    let crawler = Crawler::builder(config)
        .sink(sink.clone())
        .build()
        .await
        .unwrap();
    let report = run_crawler(&crawler).await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(
        sink.recorded(),
        vec![format!("{}/", server.uri()), format!("{}/p1", server.uri())]
    );
}

#[tokio::test]
async fn test_other_domains_are_never_contacted() {
    let in_scope = MockServer::start().await;
    let out_of_scope = MockServer::start().await;

    mount_html(
        &in_scope,
        "/",
        &format!(
            r#"<a href="{}/lure">elsewhere</a> <a href="/local">here</a>"#,
            out_of_scope.uri()
        ),
        1,
    )
    .await;
    mount_html(&in_scope, "/local", "local page", 1).await;
    mount_html(&out_of_scope, "/lure", "should never be fetched", 0).await;

    let crawler = Crawler::builder(create_test_config(&in_scope.uri()))
        .build()
        .await
        .unwrap();
    let report = run_crawler(&crawler).await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.links_discovered, 1);
    assert_eq!(report.links_enqueued, 1);

    let hits = out_of_scope.received_requests().await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_out_of_scope_redirect_target_is_still_processed() {
    let site = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    // The seed redirects off-site. The crawler follows it and processes
    // the landing page, but links found there are still filtered against
    // the allow-list, resolved from where the page actually lives.
    let landing = format!("{}/landing", elsewhere.uri());
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", landing.as_str()))
        .expect(1)
        .mount(&site)
        .await;

    mount_html(
        &elsewhere,
        "/landing",
        &format!(
            r#"<a href="/next-door">stays off-site</a> <a href="{}/back">goes back</a>"#,
            site.uri()
        ),
        1,
    )
    .await;
    mount_html(&elsewhere, "/next-door", "off-site", 0).await;
    mount_html(&site, "/back", "back in scope", 1).await;

    let mut config = create_test_config(&site.uri());
    config.start_urls = vec![format!("{}/moved", site.uri())];

    let sink = RecordingSink::new();
    let crawler = Crawler::builder(config)
        .sink(sink.clone())
        .build()
        .await
        .unwrap();
    let report = run_crawler(&crawler).await;

    // Two pages processed: the landing page (via the redirect) and /back.
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.links_discovered, 1);
    assert_eq!(report.links_enqueued, 1);

    let recorded = sink.recorded();
    assert_eq!(recorded.len(), 2);
    assert!(recorded.contains(&format!("{}/back", site.uri())));
    assert!(recorded.contains(&landing));
}

#[tokio::test]
async fn test_mutually_linked_pages_terminate() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/loop">loop</a>"#, 1).await;
    mount_html(
        &server,
        "/loop",
        r#"<a href="/">home</a> <a href="/loop">self</a>"#,
        1,
    )
    .await;

    let crawler = Crawler::builder(create_test_config(&server.uri()))
        .build()
        .await
        .unwrap();
    let report = run_crawler(&crawler).await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.urls_seen, 2);
}

#[tokio::test]
async fn test_error_status_pages_are_processed_like_any_other() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/gone">gone</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(r#"not here, try <a href="/found">found</a>"#, "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_html(&server, "/found", "worth keeping", 1).await;

    let sink = RecordingSink::new();
    let crawler = Crawler::builder(create_test_config(&server.uri()))
        .sink(sink.clone())
        .build()
        .await
        .unwrap();
    let report = run_crawler(&crawler).await;

    // A 404 is still a completed fetch: persisted, links followed.
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.fetch_failures, 0);
    assert_eq!(sink.recorded().len(), 3);
}

#[tokio::test]
async fn test_post_load_delay_is_applied_after_the_fetch() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "instant page", 1).await;

    let mut config = create_test_config(&server.uri());
    config.post_load_delay_secs = 0.5;

    let crawler = Crawler::builder(config).build().await.unwrap();
    let report = run_crawler(&crawler).await;

    assert_eq!(report.pages_fetched, 1);
    assert!(report.elapsed >= Duration::from_millis(450));
}

#[tokio::test]
async fn test_post_load_delay_counts_against_the_timeout() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "instant page", 1).await;

    let mut config = create_test_config(&server.uri());
    config.request_timeout_secs = 0.3;
    config.post_load_delay_secs = 2.0;

    let crawler = Crawler::builder(config).build().await.unwrap();
    let report = run_crawler(&crawler).await;

    // The fetch itself is instant, but the post-load delay pushes the
    // attempt past its deadline.
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.fetch_failures, 1);
}

#[tokio::test]
async fn test_crawl_from_config_file_writes_jsonl() {
    let server = MockServer::start().await;
    mount_html(&server, "/", r#"<a href="/p1">1</a>"#, 1).await;
    mount_html(&server, "/p1", "terminal page", 1).await;

    let dir = tempfile::TempDir::new().unwrap();
    let pages_path = dir.path().join("pages.jsonl");
    let config_content = format!(
        r#"
[crawl]
start-urls = ["{uri}/"]
allowed-domains = ["{uri}"]
concurrency = 2
request-timeout-secs = 5

[output]
pages-path = "{pages}"
"#,
        uri = server.uri(),
        pages = pages_path.display()
    );
    let config_file = dir.path().join("config.toml");
    std::fs::write(&config_file, config_content).unwrap();

    let config = weft::config::load_config(&config_file).unwrap();
    let report = tokio::time::timeout(Duration::from_secs(10), weft::crawler::crawl(config))
        .await
        .expect("crawl did not terminate")
        .unwrap();

    assert_eq!(report.pages_fetched, 2);

    let content = std::fs::read_to_string(&pages_path).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record["status"], 200);
        assert!(record["url"].as_str().unwrap().starts_with(&server.uri()));
        assert_eq!(record["redirected"], false);
    }
}
