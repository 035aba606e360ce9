//! Website jobs: crawl, convert and publish

use crate::common::{no_workspaces_left, pipeline, MemoryStore};
use bucket_ferry::{FerryError, Stage};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: &str) {
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

#[tokio::test]
async fn test_site_job_publishes_every_reachable_page() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <h1>Welcome</h1>
        <a href="/docs/intro">Intro</a>
        <a href="about#team">About</a>
        <a href="https://elsewhere.example/">External</a>
        <a href="mailto:team@example.com">Mail</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs/intro",
        r#"<h2>Intro</h2><p>Getting started</p><a href="../about">About</a>"#,
    )
    .await;
    mount_page(&server, "/about", "<p>About us</p>").await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let report = pipeline
        .run_site_job(&format!("{}/", server.uri()), Some(10), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files, vec!["index.md", "docs_intro.md", "about.md"]);
    assert_eq!(store.keys(), report.files);

    let intro = store.get("docs_intro.md").unwrap();
    assert_eq!(intro.content_type, "text/markdown");
    assert!(String::from_utf8(intro.body).unwrap().contains("Getting started"));

    assert!(no_workspaces_left(root.path()));
}

#[tokio::test]
async fn test_page_cap_limits_fetches() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{i}">{i}</a>"#))
        .collect();
    mount_page(&server, "/", &links).await;
    for i in 1..=5 {
        Mock::given(method("GET"))
            .and(path(format!("/p{i}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("<p>page {i}</p>")))
            .mount(&server)
            .await;
    }

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let report = pipeline
        .run_site_job(&server.uri(), Some(3), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files, vec!["index.md", "p1.md", "p2.md"]);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_broken_links_are_skipped() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_page(&server, "/", r#"<a href="/missing">x</a><a href="/ok">y</a>"#).await;
    mount_page(&server, "/ok", "<p>fine</p>").await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let report = pipeline
        .run_site_job(&server.uri(), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files, vec!["index.md", "ok.md"]);
}

#[tokio::test]
async fn test_unreachable_site_fails_crawl_stage() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let err = pipeline
        .run_site_job(&server.uri(), None, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Crawl);
    assert!(matches!(err.source, FerryError::NothingCrawled));
    assert!(store.keys().is_empty());
    assert!(no_workspaces_left(root.path()));
}

#[tokio::test]
async fn test_rejected_upload_fails_upload_stage() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_page(&server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#).await;
    mount_page(&server, "/a", "<p>a</p>").await;
    mount_page(&server, "/b", "<p>b</p>").await;

    let store = Arc::new(MemoryStore {
        reject: Some("a.md".to_string()),
        ..MemoryStore::default()
    });
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let err = pipeline
        .run_site_job(&server.uri(), None, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Upload);
    assert!(err.source.to_string().contains("a.md"));
    // index.md went up before the failure; b.md was never attempted
    assert_eq!(store.keys(), vec!["index.md"]);
    assert!(no_workspaces_left(root.path()));
}
