//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use second_order::config::{parse_config, Config, CrawlSettings};
use second_order::crawler::{run_crawl, Coordinator};
use second_order::extract::ExtractorKind;
use second_order::output::{JsonOutput, URLS_FILE};
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page that must be fetched exactly `times` times
async fn mount_page(server: &MockServer, page: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .expect(times)
        .mount(server)
        .await;
}

fn settings(server: &MockServer, depth: u32) -> CrawlSettings {
    CrawlSettings::new(Url::parse(&format!("{}/", server.uri())).unwrap())
        .with_depth(depth)
        .with_threads(4)
}

fn page_url(server: &MockServer, page: &str) -> String {
    format!("{}{}", server.uri(), page)
}

#[tokio::test]
async fn test_full_crawl_depth_two() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <img src="/logo.png">
            <a href="/page1">Page 1</a>
            <a href="{}/page2">Page 2</a>
            <a href="https://example.org/elsewhere">Elsewhere</a>
            </body></html>"#,
            base
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><body><img src="/one.png"><a href="/deeper">Deeper</a></body></html>"#.to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/page2",
        r#"<html><body><a href="/">Home</a></body></html>"#.to_string(),
        1,
    )
    .await;
    // Three hops from the seed: never fetched at depth 2
    mount_page(&server, "/deeper", "<html></html>".to_string(), 0).await;

    let config = parse_config(r#"{ "LogQueries": { "img": "src" } }"#).unwrap();
    let report = Coordinator::new(&settings(&server, 2), &config)
        .unwrap()
        .run()
        .await;

    assert!(!report.interrupted);
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(
        report.visited,
        vec![
            page_url(&server, "/"),
            page_url(&server, "/page1"),
            page_url(&server, "/page2"),
        ]
    );

    let attributes = report.findings.get(ExtractorKind::AttributeValue).unwrap();
    assert_eq!(attributes[&page_url(&server, "/")]["img[src]"], vec!["/logo.png"]);
    assert_eq!(attributes[&page_url(&server, "/page1")]["img[src]"], vec!["/one.png"]);
    assert!(!attributes.contains_key(&page_url(&server, "/page2")));
}

#[tokio::test]
async fn test_depth_zero_performs_no_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html></html>".to_string(), 0).await;

    let report = Coordinator::new(&settings(&server, 0), &Config::default())
        .unwrap()
        .run()
        .await;

    assert!(report.visited.is_empty());
    assert_eq!(report.stats.pages_fetched, 0);
}

#[tokio::test]
async fn test_depth_one_fetches_only_seed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/child">child</a>"#.to_string(),
        1,
    )
    .await;
    mount_page(&server, "/child", "<html></html>".to_string(), 0).await;

    let report = Coordinator::new(&settings(&server, 1), &Config::default())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.visited, vec![page_url(&server, "/")]);
}

#[tokio::test]
async fn test_seed_fragment_shares_visited_entry() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/">home</a><a href="/#footer">footer</a>"#.to_string(),
        1,
    )
    .await;

    let seed = Url::parse(&format!("{}/#top", server.uri())).unwrap();
    let settings = CrawlSettings::new(seed).with_depth(2).with_threads(4);
    let report = Coordinator::new(&settings, &Config::default())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.visited, vec![page_url(&server, "/")]);
    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_depth_bounds_hop_count() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/1">1</a>"#.to_string(), 1).await;
    mount_page(&server, "/1", r#"<a href="/2">2</a>"#.to_string(), 1).await;
    mount_page(&server, "/2", r#"<a href="/3">3</a>"#.to_string(), 1).await;
    mount_page(&server, "/3", r#"<a href="/4">4</a>"#.to_string(), 0).await;

    let report = Coordinator::new(&settings(&server, 3), &Config::default())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.visited.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_page_fetched_once_under_concurrency() {
    let server = MockServer::start().await;
    let pages: Vec<String> = (0..8).map(|i| format!("/p{}", i)).collect();

    // Every page links to every other page, the seed and itself
    let mesh: String = std::iter::once("/".to_string())
        .chain(pages.iter().cloned())
        .map(|p| format!(r#"<a href="{}">x</a><a href="{}#top">y</a>"#, p, p))
        .collect();

    mount_page(&server, "/", mesh.clone(), 1).await;
    for page in &pages {
        mount_page(&server, page, mesh.clone(), 1).await;
    }

    let report = Coordinator::new(&settings(&server, 3).with_threads(8), &Config::default())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stats.pages_fetched, 9);
    assert_eq!(report.visited.len(), 9);
    assert_eq!(report.stats.links_discovered, 8);
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/limited">a</a><a href="/report.pdf">b</a>
           <a href="/missing">c</a><a href="/ok">d</a>"#
            .to_string(),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<html><title>ok</title></html>".to_string(), 1).await;

    let report = Coordinator::new(&settings(&server, 2), &Config::default())
        .unwrap()
        .run()
        .await;

    assert!(!report.interrupted);
    assert_eq!(report.visited.len(), 5);
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.rate_limited, 1);
    assert_eq!(report.stats.non_html, 1);
    assert_eq!(report.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_non_200_probe_records_interesting_values() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head>
            <script src="{base}/missing.js"></script>
            <script src="{base}/present.js"></script>
            <script src="{base}/forbidden.js"></script>
            <script src="http://127.0.0.1:9/dead.js"></script>
            <script src="/relative.js"></script>
            <script src="{base}/ignored/lib.js"></script>
            </head></html>"#,
            base = base
        ),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.js"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/present.js"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forbidden.js"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ignored/lib.js"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let config = parse_config(
        r#"{
            "LogNon200Queries": { "script": "src" },
            "ExcludedStatusCodes": [403],
            "ExcludedUrlRegex": ["/ignored/"]
        }"#,
    )
    .unwrap();
    let report = Coordinator::new(&settings(&server, 1), &config)
        .unwrap()
        .run()
        .await;

    let probes = report.findings.get(ExtractorKind::NonOkProbe).unwrap();
    assert_eq!(
        probes[&page_url(&server, "/")]["script[src]"],
        vec![
            format!("{}/missing.js", base),
            "http://127.0.0.1:9/dead.js".to_string(),
        ]
    );
    assert_eq!(report.stats.probes_sent, 4);
    assert_eq!(report.stats.probes_flagged, 2);
}

#[tokio::test]
async fn test_base_href_used_for_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><base href="{}/app/"></head>
            <body><a href="page">Page</a></body></html>"#,
            base
        ),
        1,
    )
    .await;
    mount_page(&server, "/app/page", "<html></html>".to_string(), 1).await;

    let report = Coordinator::new(&settings(&server, 2), &Config::default())
        .unwrap()
        .run()
        .await;

    assert!(report.visited.contains(&page_url(&server, "/app/page")));
}

#[tokio::test]
async fn test_configured_headers_sent_on_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer recon"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"<a href="/next">next</a>"#, "text/html"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("Authorization".to_string(), "Bearer recon".to_string());

    let report = Coordinator::new(
        &settings(&server, 2).with_headers(headers),
        &Config::default(),
    )
    .unwrap()
    .run()
    .await;

    assert_eq!(report.stats.pages_fetched, 2);
}

#[tokio::test]
async fn test_results_written_as_json() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Welcome</title>
        <script>var token = "abc";</script></head>
        <body><form action="/login"></form><a href="/about">About</a></body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/about",
        "<html><head><title>About</title></head></html>".to_string(),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = parse_config(
        r#"{
            "LogQueries": { "forms": { "tag": "form", "attribute": "action" } },
            "LogInline": ["title"],
            "LogInlineJS": true,
            "LogCrawledURLs": true
        }"#,
    )
    .unwrap();
    let sink = JsonOutput::new(dir.path(), config.log_crawled_urls);

    run_crawl(&settings(&server, 2), &config, &sink, std::future::pending())
        .await
        .unwrap();

    let seed = page_url(&server, "/");
    let about = page_url(&server, "/about");

    let attributes: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("attributes.json")).unwrap())
            .unwrap();
    assert_eq!(attributes[&seed]["forms"], serde_json::json!(["/login"]));

    let inline: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("inline.json")).unwrap())
            .unwrap();
    assert_eq!(inline[&seed]["title"], serde_json::json!(["Welcome"]));
    assert_eq!(inline[&seed]["inline-js"], serde_json::json!([r#"var token = "abc";"#]));
    assert_eq!(inline[&about]["title"], serde_json::json!(["About"]));

    assert!(!dir.path().join("non-200-url-attributes.json").exists());

    let urls = std::fs::read_to_string(dir.path().join(URLS_FILE)).unwrap();
    assert_eq!(urls, format!("{}\n{}", seed, about));
}

#[tokio::test]
async fn test_interrupt_flushes_partial_results() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/slow">Slow</a></body></html>"#
            .to_string(),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><title>Slow</title></html>", "text/html")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = parse_config(r#"{ "LogInline": ["title"] }"#).unwrap();
    let sink = JsonOutput::new(dir.path(), false);
    let shutdown = tokio::time::sleep(Duration::from_millis(500));

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        run_crawl(&settings(&server, 2), &config, &sink, shutdown),
    )
    .await
    .expect("interrupt should not wait for in-flight fetches")
    .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.visited.len(), 2);

    let inline: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("inline.json")).unwrap())
            .unwrap();
    let seed = page_url(&server, "/");
    assert_eq!(inline[&seed]["title"], serde_json::json!(["Home"]));
    assert!(inline.get(page_url(&server, "/slow")).is_none());
}
