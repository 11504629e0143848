//! Integration tests for complete audits
//!
//! A wiremock server plays the local site; audits run through the processor
//! with the HTTP render backend and land in a temporary store.

use seo_audit::config::{AuditConfig, CrawlerConfig};
use seo_audit::output::format_audit_report;
use seo_audit::{
    analyze, check_page, AnalysisStatus, AuditError, AuditProcessor, AuditStatus, LocalStore,
};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, status: u16, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// A page that passes every check
fn good_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">Read more about {}</a> "#, href, href))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <meta name="description" content="{description}">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta property="og:title" content="{title}">
  <script type="application/ld+json">{{"@type": "WebPage"}}</script>
</head>
<body>
  <h1>{title}</h1>
  <h2>Details</h2>
  <p>{words}</p>
  {anchors}
</body>
</html>"#,
        title = title,
        description = "A description that is long enough to satisfy the length check while \
                       still reading naturally for visitors and search engines.",
        words = "lorem ".repeat(300),
        anchors = anchors,
    )
}

fn processor() -> (TempDir, AuditProcessor) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(dir.path().join("audits")).unwrap());
    (dir, AuditProcessor::new(store, CrawlerConfig::default()))
}

#[tokio::test]
async fn test_end_to_end_audit() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        200,
        good_page("Welcome to the local test site", &["/about", "/gone"]),
    )
    .await;
    mount_page(
        &server,
        "/about",
        200,
        good_page("About the local test site team", &["/"]),
    )
    .await;
    mount_page(&server, "/gone", 404, "Not found".to_string()).await;

    let (_dir, processor) = processor();
    let audit = processor
        .run_http_audit(&server.uri(), AuditConfig::default())
        .await
        .unwrap();

    assert_eq!(audit.status, AuditStatus::Completed);
    assert_eq!(audit.pages.len(), 3);
    assert_eq!(audit.pages_discovered, 3);

    let summary = audit.summary.as_ref().unwrap();
    assert_eq!(summary.analyzed_pages, 2);
    assert_eq!(summary.failed_pages, 1);
    assert_eq!(summary.missing_titles, 0);
    assert_eq!(summary.duplicate_descriptions, 1);

    let gone = audit
        .pages
        .iter()
        .find(|p| p.url().ends_with("/gone"))
        .unwrap();
    assert_eq!(gone.analysis_status, AnalysisStatus::Failed);
    assert_eq!(gone.seo_score, 0.0);

    // Pages are keyed by normalized URL and survive a reload
    let home_url = format!("{}/", server.uri());
    let home = processor.get_page_details(&audit.id, &home_url).unwrap();
    assert!(home.indexable);
    assert_eq!(home.checks.len(), 26);

    let reloaded = processor.get_audit_status(&audit.id).unwrap();
    assert_eq!(reloaded.overall_score, audit.overall_score);

    let report = format_audit_report(&reloaded).unwrap();
    assert!(report.contains(&audit.id));
}

#[tokio::test]
async fn test_max_pages_one_end_to_end() {
    let server = MockServer::start().await;
    let links: Vec<String> = (0..10).map(|i| format!("/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", 200, good_page("Home page of the test site", &link_refs)).await;
    for link in &link_refs {
        mount_page(&server, link, 200, good_page("A leaf page of the site", &[])).await;
    }

    let (_dir, processor) = processor();
    let config = AuditConfig {
        max_pages: 1,
        ..Default::default()
    };
    let audit = processor.run_http_audit(&server.uri(), config).await.unwrap();

    assert_eq!(audit.status, AuditStatus::Completed);
    assert_eq!(audit.pages.len(), 1);
    assert_eq!(audit.summary.unwrap().total_pages, 1);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_crawling() {
    let (_dir, processor) = processor();
    let config = AuditConfig {
        ignore_patterns: vec!["/(unclosed/".to_string()],
        ..Default::default()
    };

    let result = processor
        .run_http_audit("http://localhost:3000", config)
        .await;
    assert!(matches!(result, Err(AuditError::Config(_))));
    assert!(processor.list_audits().unwrap().is_empty());
}

#[tokio::test]
async fn test_audits_listed_and_deleted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", 200, good_page("Single page site for listing", &[])).await;

    let (_dir, processor) = processor();
    let first = processor
        .run_http_audit(&server.uri(), AuditConfig::default())
        .await
        .unwrap();
    let second = processor
        .run_http_audit(&server.uri(), AuditConfig::default())
        .await
        .unwrap();

    let listed = processor.list_audits().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);

    processor.delete_audit(&first.id).unwrap();
    assert_eq!(processor.list_audits().unwrap().len(), 1);
}

#[test]
fn test_short_title_long_body_fixture() {
    let words = "word ".repeat(250);
    let html = format!(
        "<html><head><title>X</title></head><body><p>{}</p></body></html>",
        words
    );

    let analysis = analyze(&html, "http://localhost:3000/").unwrap();
    assert_eq!(analysis.content.title_length, 1);
    assert_eq!(analysis.content.word_count, 250);

    let results = check_page(&analysis, 200, "http://localhost:3000/");
    assert!(results.checks["title_presence"].passed);
    assert!(!results.checks["title_length"].passed);
    assert!(results.checks["content_length"].passed);
}
