//! Integration tests for the archiver
//!
//! These tests use wiremock to create mock HTTP servers and tempfile output
//! directories to run the full fetch, extract, score and store cycle
//! end-to-end.

use scrapyer::config::Config;
use scrapyer::crawler::Coordinator;
use scrapyer::storage::{CONTENT_FILE, LINKS_FILE, METADATA_FILE, SUMMARY_FILE};
use scrapyer::{content_fingerprint, normalize_url, SkipReason, TerminationReason};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESEARCH_PARAGRAPH: &str = "Researchers found that depression in older adults may signal \
    early stages of Parkinson's disease. The study, published in the journal Neurology by \
    teams at Harvard and Oxford, followed 2,400 participants for 12 years. According to \
    the researchers, the average risk rose by 40 percent among those with symptoms.";

/// Creates a crawl-enabled, text-only configuration with fast retries
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawl.enabled = true;
    config.crawl.workers = 2;
    config.fetch.timeout_secs = 5;
    config.fetch.max_attempts = 3;
    config.fetch.retry_base_delay_ms = 10;
    config.fetch.retry_max_delay_ms = 20;
    config.extract.text_only = true;
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>Test</title></head><body><article>{}</article></body></html>",
            body
        ),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

/// Number of requests the server received for one path
async fn requests_for(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

fn fingerprint_of(url: &str) -> String {
    content_fingerprint(&normalize_url(url).unwrap())
}

#[tokio::test]
async fn test_cross_domain_links_are_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = url::Url::parse(&base).unwrap().port().unwrap();

    // Same server under a different host name is a different site
    mount_page(
        &server,
        "/p1",
        &format!(
            r#"<p>First page of the site.</p>
            <a href="/p2">second</a>
            <a href="http://localhost:{}/x">elsewhere</a>"#,
            port
        ),
    )
    .await;
    mount_page(&server, "/p2", "<p>Second page of the site.</p>").await;
    mount_page(&server, "/x", "<p>Another site entirely.</p>").await;

    let mut config = create_test_config();
    config.crawl.limit = Some(5);

    let temp = TempDir::new().unwrap();
    let seed = format!("{}/p1", base);
    let summary = Coordinator::new(config, &seed, temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_attempted, 2);
    assert_eq!(summary.pages_retained, 2);
    assert_eq!(requests_for(&server, "/p1").await, 1);
    assert_eq!(requests_for(&server, "/p2").await, 1);
    assert_eq!(requests_for(&server, "/x").await, 0);
}

#[tokio::test]
async fn test_redirects_off_site_are_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = url::Url::parse(&base).unwrap().port().unwrap();

    mount_page(&server, "/p1", r#"<p>First page of the site.</p><a href="/hop">moved</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("http://localhost:{}/x", port).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/x", "<p>Another site entirely.</p>").await;

    let mut config = create_test_config();
    config.crawl.limit = Some(5);

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config, &format!("{}/p1", base), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(requests_for(&server, "/x").await, 0);
    assert_eq!(requests_for(&server, "/hop").await, 1);
    assert_eq!(summary.pages_retained, 1);

    let fatal = summary.skipped_by_reason(SkipReason::FatalFailure);
    assert_eq!(fatal.len(), 1);
    assert!(fatal[0].url.ends_with("/hop"));
    assert!(!temp.path().join(fingerprint_of(&format!("{}/hop", base))).exists());
}

#[tokio::test]
async fn test_page_limit_stops_crawl() {
    let server = MockServer::start().await;

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/page{}">page {}</a> "#, i, i))
        .collect();
    mount_page(&server, "/", &format!("<p>Index page.</p><div>{}</div>", links)).await;
    for i in 1..=5 {
        mount_page(&server, &format!("/page{}", i), &format!("<p>Page number {}.</p>", i)).await;
    }

    let mut config = create_test_config();
    config.crawl.limit = Some(3);

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config, &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_attempted, 3);
    assert_eq!(summary.termination, Some(TerminationReason::LimitReached));

    // Breadth-first: the first two links are the ones admitted
    assert_eq!(requests_for(&server, "/page1").await, 1);
    assert_eq!(requests_for(&server, "/page2").await, 1);
    assert_eq!(requests_for(&server, "/page3").await, 0);
}

#[tokio::test]
async fn test_timeouts_are_retried_then_skipped() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<p>Index page.</p><a href="/slow">slow</a> <a href="/after">after</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("<p>Too late.</p>").set_delay(Duration::from_millis(2500)))
        .mount(&server)
        .await;
    mount_page(&server, "/after", "<p>The crawl carried on.</p>").await;

    let mut config = create_test_config();
    config.fetch.timeout_secs = 1;
    config.crawl.workers = 1;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config, &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(requests_for(&server, "/slow").await, 3);
    assert_eq!(requests_for(&server, "/after").await, 1);

    let transient = summary.skipped_by_reason(SkipReason::TransientFailure);
    assert_eq!(transient.len(), 1);
    assert!(transient[0].url.ends_with("/slow"));
    assert_eq!(summary.pages_retained, 2);
    assert_eq!(summary.termination, Some(TerminationReason::FrontierExhausted));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>Index page.</p><a href="/missing">gone</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(create_test_config(), &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(requests_for(&server, "/missing").await, 1);
    assert_eq!(summary.skipped_by_reason(SkipReason::FatalFailure).len(), 1);
    assert_eq!(summary.pages_retained, 1);
}

#[tokio::test]
async fn test_non_document_links_are_skipped() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>Index page.</p><a href="/paper.pdf">paper</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(create_test_config(), &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        summary.skipped_by_reason(SkipReason::UnsupportedContent).len(),
        1
    );
}

#[tokio::test]
async fn test_quality_filter_threshold() {
    let body = format!(
        "<p>{}</p><p>Home | News | Sport | Weather | More</p>",
        RESEARCH_PARAGRAPH
    );

    // Threshold 0.6: the research paragraph passes, the menu line does not
    let server = MockServer::start().await;
    mount_page(&server, "/", &body).await;

    let mut config = create_test_config();
    config.crawl.enabled = false;
    config.quality.enabled = true;
    config.quality.threshold = 0.6;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config.clone(), &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_retained, 1);
    assert_eq!(summary.blocks_scored, 2);
    assert_eq!(summary.blocks_retained, 1);

    let dir = temp.path().join(fingerprint_of(&server.uri()));
    let content = std::fs::read_to_string(dir.join(CONTENT_FILE)).unwrap();
    assert!(content.contains("Parkinson's disease"));
    assert!(!content.contains("Weather"));

    // Threshold 0.9: nothing passes and no page directory is written
    config.quality.threshold = 0.9;
    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config, &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_retained, 0);
    assert_eq!(
        summary.skipped_by_reason(SkipReason::NoRetainedContent).len(),
        1
    );
    assert!(!temp.path().join(fingerprint_of(&server.uri())).exists());
}

#[tokio::test]
async fn test_page_directories_use_fingerprints() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Identical titles and text must still land in different directories
    mount_page(
        &server,
        "/",
        r#"<p>Same words on every page.</p><a href="/a">a</a> <a href="/b">b</a>"#,
    )
    .await;
    mount_page(&server, "/a", "<p>Same words on every page.</p>").await;
    mount_page(&server, "/b", "<p>Same words on every page.</p>").await;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(create_test_config(), &base, temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_retained, 3);
    for route in ["/", "/a", "/b"] {
        let dir = temp.path().join(fingerprint_of(&format!("{}{}", base, route)));
        assert!(dir.join(CONTENT_FILE).is_file(), "missing {}", route);
        assert!(dir.join(METADATA_FILE).is_file());
        assert!(dir.join(LINKS_FILE).is_file());
    }

    let root_links =
        std::fs::read_to_string(temp.path().join(fingerprint_of(&base)).join(LINKS_FILE)).unwrap();
    assert!(root_links.contains(&format!("{}/a", base)));

    let markdown = std::fs::read_to_string(temp.path().join(SUMMARY_FILE)).unwrap();
    assert!(markdown.contains("| Retained | 3 |"));
}

#[tokio::test]
async fn test_single_page_mode_ignores_links() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>Only this page.</p><a href="/next">next</a>"#).await;
    mount_page(&server, "/next", "<p>Never fetched.</p>").await;

    let mut config = create_test_config();
    config.crawl.enabled = false;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config, &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_attempted, 1);
    assert_eq!(summary.pages_retained, 1);
    assert_eq!(requests_for(&server, "/next").await, 0);
}

#[tokio::test]
async fn test_media_is_saved_with_page() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<p>A page with a chart.</p><img src="/img/chart.png" alt="chart">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/chart.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89u8, b'P', b'N', b'G'], "image/png"),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawl.enabled = false;
    config.extract.text_only = false;

    let temp = TempDir::new().unwrap();
    let summary = Coordinator::new(config, &server.uri(), temp.path())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.media_saved, 1);
    let image = temp
        .path()
        .join(fingerprint_of(&server.uri()))
        .join("images")
        .join("chart.png");
    assert_eq!(std::fs::read(image).unwrap(), vec![0x89u8, b'P', b'N', b'G']);
}
