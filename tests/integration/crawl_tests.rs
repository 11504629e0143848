//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site and run the full crawl
//! cycle through the HTTP render backend.

use seo_audit::config::{AuditConfig, CrawlerConfig};
use seo_audit::crawler::{crawl, Crawler, HttpRenderBackend, PageResult, RenderBackend};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `html` at `route`
async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Page linking to each of `links`
fn page_with_links(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

fn backend() -> Arc<dyn RenderBackend> {
    Arc::new(HttpRenderBackend::launch(&CrawlerConfig::default()).unwrap())
}

fn sorted_paths(results: &[PageResult]) -> Vec<String> {
    let mut paths: Vec<String> = results
        .iter()
        .map(|r| url::Url::parse(&r.url).unwrap().path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_full_crawl_respects_robots() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private\nAllow: /private/open").await;
    mount_page(
        &server,
        "/",
        page_with_links("Home", &["/about", "/blog", "/private/secret", "/private/open"]),
    )
    .await;
    mount_page(&server, "/about", page_with_links("About", &["/", "/blog#latest"])).await;
    mount_page(&server, "/blog", page_with_links("Blog", &["/blog/first-post/"])).await;
    mount_page(&server, "/blog/first-post", page_with_links("Post", &["/about"])).await;
    mount_page(&server, "/private/secret", page_with_links("Secret", &[])).await;
    mount_page(&server, "/private/open", page_with_links("Open", &[])).await;

    let results = crawl(
        &server.uri(),
        AuditConfig::default(),
        &CrawlerConfig::default(),
        backend(),
    )
    .await
    .unwrap();

    assert_eq!(
        sorted_paths(&results),
        vec!["/", "/about", "/blog", "/blog/first-post", "/private/open"]
    );
    assert!(results.iter().all(|r| r.status_code == 200));
}

#[tokio::test]
async fn test_max_pages_one_with_many_links() {
    let server = MockServer::start().await;
    let links: Vec<String> = (0..10).map(|i| format!("/page-{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", page_with_links("Home", &link_refs)).await;
    for link in &link_refs {
        mount_page(&server, link, page_with_links("Leaf", &[])).await;
    }

    let config = AuditConfig {
        max_pages: 1,
        ..Default::default()
    };
    let crawler = Crawler::new(&server.uri(), config, &CrawlerConfig::default(), backend()).unwrap();
    crawler.start().await.unwrap();

    let results = crawler.results();
    assert_eq!(results.len(), 1);
    assert_eq!(sorted_paths(&results), vec!["/"]);
}

#[tokio::test]
async fn test_max_depth_limits_discovery() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links("Root", &["/one"])).await;
    mount_page(&server, "/one", page_with_links("One", &["/two"])).await;
    mount_page(&server, "/two", page_with_links("Two", &["/three"])).await;
    mount_page(&server, "/three", page_with_links("Three", &[])).await;

    let config = AuditConfig {
        max_depth: 1,
        ..Default::default()
    };
    let results = crawl(&server.uri(), config, &CrawlerConfig::default(), backend())
        .await
        .unwrap();

    assert_eq!(sorted_paths(&results), vec!["/", "/one"]);
    assert!(results.iter().all(|r| r.depth <= 1));
}

#[tokio::test]
async fn test_external_links_and_ignore_patterns() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page_with_links(
            "Home",
            &[
                "https://external.example/",
                "mailto:owner@example.com",
                "/docs/manual.pdf",
                "/admin/users",
                "/contact",
            ],
        ),
    )
    .await;
    mount_page(&server, "/contact", page_with_links("Contact", &[])).await;

    let config = AuditConfig {
        ignore_patterns: vec!["/admin".to_string(), r"/\.pdf$/".to_string()],
        ..Default::default()
    };
    let results = crawl(&server.uri(), config, &CrawlerConfig::default(), backend())
        .await
        .unwrap();

    assert_eq!(sorted_paths(&results), vec!["/", "/contact"]);
}

#[tokio::test]
async fn test_error_pages_are_recorded() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links("Home", &["/missing"])).await;

    let results = crawl(
        &server.uri(),
        AuditConfig::default(),
        &CrawlerConfig::default(),
        backend(),
    )
    .await
    .unwrap();

    let missing = results
        .iter()
        .find(|r| r.url.ends_with("/missing"))
        .unwrap();
    assert_eq!(missing.status_code, 404);
}

#[tokio::test]
async fn test_unreachable_site_records_failed_fetch() {
    let results = crawl(
        "http://127.0.0.1:9/",
        AuditConfig::default(),
        &CrawlerConfig::default(),
        backend(),
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status_code, 0);
    assert!(results[0].content.is_empty());
}
