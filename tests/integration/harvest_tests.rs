//! Integration tests for the harvester
//!
//! These tests use wiremock to serve listing and item pages and run the
//! full two-phase harvest end-to-end against a temporary CSV snapshot.

use catalog_harvest::config::{load_config, Config};
use catalog_harvest::crawler::{harvest, DetailFetcher, FailureKind};
use catalog_harvest::output::read_snapshot;
use catalog_harvest::state::{CandidateLink, ProductRecord};
use catalog_harvest::HarvestError;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a config for the mock server and loads it the way the CLI does
fn create_test_config(dir: &Path, base_url: &str, extra_listing: &str, extra_fetch: &str) -> Config {
    let output = dir.join("products.csv");
    let toml = format!(
        r#"
[listing]
url-template = "{base_url}/list?page={{page}}"
max-pages = 3
content-timeout-ms = 2000
{extra_listing}

[fetch]
concurrency = 4
request-timeout-secs = 1
delay-min-ms = 0
delay-max-ms = 0
{extra_fetch}

[output]
path = "{output}"
checkpoint-interval = 20
"#,
        base_url = base_url,
        extra_listing = extra_listing,
        extra_fetch = extra_fetch,
        output = output.display()
    );

    let config_path = dir.join("harvest.toml");
    std::fs::write(&config_path, toml).expect("Failed to write config");
    load_config(&config_path).expect("Failed to load config")
}

/// Renders a listing page with the given item hrefs
fn listing_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<div class="tile"><a href="{}">item</a></div>"#, href))
        .collect();
    format!(
        r#"<html><body><a href="/about">About</a>{}<a href="/cart">Cart</a></body></html>"#,
        anchors
    )
}

async fn mount_listing(server: &MockServer, page: u32, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(hrefs))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn item_page(title: &str, price: &str, image: &str) -> String {
    format!(
        r#"<html><head>
        <meta property="og:title" content="{}">
        <meta property="og:image" content="{}">
        </head><body><div class="price">{}</div></body></html>"#,
        title, image, price
    )
}

#[tokio::test]
async fn test_end_to_end_keeps_only_titled_records() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["/shoe-x/p/a", "/shoe-y/p/b", "/shoe-z/p/c"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_listing(&server, 3, &[]).await;

    mount_item(
        &server,
        "/shoe-x/p/a",
        r#"<html><head><meta property="og:title" content="Shoe X"></head><body><p>Comfortable</p></body></html>"#
            .to_string(),
    )
    .await;
    mount_item(
        &server,
        "/shoe-y/p/b",
        "<html><body><p>No title here, ₹999</p></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/shoe-z/p/c"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(item_page("Shoe Z", "₹1", ""))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = create_test_config(dir.path(), &base_url, "", "");
    let output = config.output.path.clone();
    let report = harvest(config).await.expect("Harvest should complete");

    assert_eq!(report.total_candidates, 3);
    assert_eq!(report.total_records, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Timeout);
    assert!(report.failures[0].url.ends_with("/shoe-z/p/c"));
    assert!(report.final_flush_error.is_none());

    let records = read_snapshot(Path::new(&output)).unwrap();
    assert_eq!(
        records,
        vec![ProductRecord {
            title: "Shoe X".to_string(),
            price: String::new(),
            image: String::new(),
            link: format!("{}/shoe-x/p/a", base_url),
        }]
    );
}

#[tokio::test]
async fn test_generic_page_title_is_not_a_product_title() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["/shoe-x/p/a", "/shoe-y/p/b"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_listing(&server, 3, &[]).await;

    mount_item(&server, "/shoe-x/p/a", item_page("Shoe X", "₹1,299", "")).await;
    mount_item(
        &server,
        "/shoe-y/p/b",
        r#"<html><head><title>Online Shopping Site</title></head>
        <body><p>Something went wrong</p></body></html>"#
            .to_string(),
    )
    .await;

    let config = create_test_config(dir.path(), &base_url, "", "");
    let output = config.output.path.clone();
    let report = harvest(config).await.unwrap();

    assert_eq!(report.total_candidates, 2);
    assert_eq!(report.total_records, 1);
    assert_eq!(report.dropped, 1);

    let records = read_snapshot(Path::new(&output)).unwrap();
    let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Shoe X"]);
}

#[tokio::test]
async fn test_links_repeated_across_pages_are_fetched_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    // The same item shows up on every page, once with tracking noise
    mount_listing(&server, 1, &["/shared/p/s", "/one/p/1"]).await;
    mount_listing(&server, 2, &["/shared/p/s?otracker=search", "/two/p/2"]).await;
    mount_listing(&server, 3, &["/shared/p/s#reviews", "/three/p/3"]).await;

    Mock::given(method("GET"))
        .and(path("/shared/p/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page("Shared", "₹10", "/s.jpg")))
        .expect(1)
        .mount(&server)
        .await;
    for (route, title) in [("/one/p/1", "One"), ("/two/p/2", "Two"), ("/three/p/3", "Three")] {
        mount_item(&server, route, item_page(title, "₹20", "/i.jpg")).await;
    }

    let config = create_test_config(dir.path(), &base_url, "", "");
    let output = config.output.path.clone();
    let report = harvest(config).await.unwrap();

    assert_eq!(report.total_candidates, 4);
    assert_eq!(report.total_records, 4);
    assert!(report.is_clean());

    let records = read_snapshot(Path::new(&output)).unwrap();
    let links: HashSet<_> = records.iter().map(|r| r.link.clone()).collect();
    assert_eq!(links.len(), 4);
    assert!(links.contains(&format!("{}/shared/p/s", base_url)));

    let shared = records.iter().find(|r| r.title == "Shared").unwrap();
    assert_eq!(shared.price, "₹10");
    assert_eq!(shared.image, format!("{}/s.jpg", base_url));
}

#[tokio::test]
async fn test_two_empty_pages_stop_traversal() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["/a/p/1"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_listing(&server, 3, &[]).await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/b/p/2"])))
        .expect(0)
        .mount(&server)
        .await;
    mount_item(&server, "/a/p/1", item_page("A", "₹1", "")).await;

    let mut config = create_test_config(dir.path(), &base_url, "", "");
    config.listing.max_pages = 5;
    let report = harvest(config).await.unwrap();

    assert_eq!(report.traversal.pages_attempted, 3);
    assert!(report.traversal.stopped_early);
    assert_eq!(report.total_candidates, 1);
    assert_eq!(report.total_records, 1);
}

#[tokio::test]
async fn test_single_empty_page_does_not_stop() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &["/a/p/1"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_listing(&server, 3, &["/c/p/3"]).await;
    mount_item(&server, "/a/p/1", item_page("A", "₹1", "")).await;
    mount_item(&server, "/c/p/3", item_page("C", "₹3", "")).await;

    let config = create_test_config(dir.path(), &base_url, "", "");
    let report = harvest(config).await.unwrap();

    assert_eq!(report.traversal.pages_attempted, 3);
    assert!(!report.traversal.stopped_early);
    assert_eq!(report.total_records, 2);
}

#[tokio::test]
async fn test_skip_policy_visits_every_page() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &[]).await;
    mount_listing(&server, 2, &[]).await;
    mount_listing(&server, 3, &["/c/p/3"]).await;
    mount_item(&server, "/c/p/3", item_page("C", "₹3", "")).await;

    let config = create_test_config(dir.path(), &base_url, r#"on-missing = "skip""#, "");
    let report = harvest(config).await.unwrap();

    assert_eq!(report.traversal.pages_attempted, 3);
    assert_eq!(report.traversal.pages_with_content, 1);
    assert_eq!(report.total_records, 1);
}

#[tokio::test]
async fn test_empty_listing_writes_header_only_snapshot() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, &[]).await;
    mount_listing(&server, 2, &[]).await;

    let config = create_test_config(dir.path(), &base_url, "", "");
    let output = config.output.path.clone();
    let report = harvest(config).await.unwrap();

    assert_eq!(report.total_candidates, 0);
    assert_eq!(report.total_records, 0);
    assert_eq!(report.checkpoints_written, 1);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.trim(), "title,price,image,link");
}

#[tokio::test]
async fn test_unreachable_listing_is_fatal() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = create_test_config(dir.path(), &base_url, "", "");
    let output = config.output.path.clone();
    let result = harvest(config).await;

    assert!(matches!(
        result,
        Err(HarvestError::NavigationFailed { attempted: 2, .. })
    ));
    assert!(!Path::new(&output).exists());
}

#[tokio::test]
async fn test_checkpoints_hold_unique_links() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    let routes: Vec<String> = (0..25).map(|i| format!("/item-{}/p/{}", i, i)).collect();
    let hrefs: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_listing(&server, 1, &hrefs).await;
    mount_listing(&server, 2, &[]).await;
    mount_listing(&server, 3, &[]).await;
    for (i, route) in routes.iter().enumerate() {
        mount_item(&server, route, item_page(&format!("Item {}", i), "₹5", "")).await;
    }

    let config = create_test_config(dir.path(), &base_url, "", "");
    let output = config.output.path.clone();
    let report = harvest(config).await.unwrap();

    // One checkpoint at 20 plus the final snapshot
    assert_eq!(report.checkpoints_written, 2);
    assert_eq!(report.total_records, 25);

    let records = read_snapshot(Path::new(&output)).unwrap();
    let links: HashSet<_> = records.iter().map(|r| r.link.as_str()).collect();
    assert_eq!(records.len(), 25);
    assert_eq!(links.len(), 25);
}

#[tokio::test]
async fn test_fetch_without_structured_fields() {
    let server = MockServer::start().await;
    mount_item(
        &server,
        "/bare/p/1",
        "<html><body><h1>Bare</h1><p>Nothing structured</p></body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "", "");
    let fetcher = DetailFetcher::from_config(&config.fetch, &config.headers).unwrap();
    let link = CandidateLink::new(format!("{}/bare/p/1", server.uri()), 1);

    let record = fetcher.fetch(&link).await.unwrap();

    assert_eq!(record.title, "");
    assert_eq!(record.price, "");
    assert_eq!(record.image, "");
    assert_eq!(record.link, link.url);
    assert!(!record.is_retainable());
}

#[tokio::test]
async fn test_fetch_error_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone/p/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "", "");
    let fetcher = DetailFetcher::from_config(&config.fetch, &config.headers).unwrap();
    let link = CandidateLink::new(format!("{}/gone/p/1", server.uri()), 1);

    let failure = fetcher.fetch(&link).await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::Status(404));
    assert_eq!(failure.url, link.url);
}

#[tokio::test]
async fn test_fetch_stage_is_idempotent() {
    let server = MockServer::start().await;
    let routes = ["/a/p/1", "/b/p/2", "/c/p/3"];
    for (i, route) in routes.iter().enumerate() {
        mount_item(&server, route, item_page(&format!("T{}", i), "Now ₹ 1,299 only", "/img.png")).await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "", "");
    let fetcher = DetailFetcher::from_config(&config.fetch, &config.headers).unwrap();
    let links: Vec<_> = routes
        .iter()
        .map(|route| CandidateLink::new(format!("{}{}", server.uri(), route), 1))
        .collect();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut records = HashSet::new();
        for link in links.iter().rev() {
            records.insert(fetcher.fetch(link).await.unwrap());
        }
        runs.push(records);
    }

    assert_eq!(runs[0], runs[1]);
    assert!(runs[0].iter().all(|r| r.price == "Now ₹ 1,299 only"));
}

#[tokio::test]
async fn test_outbound_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/h/p/1"))
        .and(header("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64)"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page("H", "₹1", "")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "", "");
    let fetcher = DetailFetcher::from_config(&config.fetch, &config.headers).unwrap();
    let link = CandidateLink::new(format!("{}/h/p/1", server.uri()), 1);

    let record = fetcher.fetch(&link).await.unwrap();
    assert_eq!(record.title, "H");
}
