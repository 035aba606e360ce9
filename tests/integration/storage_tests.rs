//! Publishing through the signed S3 client

use bucket_ferry::archive::ArchiveResolver;
use bucket_ferry::config::{StorageConfig, UserAgentConfig};
use bucket_ferry::crawler::{build_http_client, HttpFetcher};
use bucket_ferry::{storage, Pipeline, Stage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, header_exists, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage_config(endpoint: &str) -> StorageConfig {
    StorageConfig {
        endpoint_url: Some(endpoint.to_string()),
        access_key: Some("AKIDEXAMPLE".to_string()),
        secret_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
        bucket: Some("site-docs".to_string()),
        ..StorageConfig::default()
    }
}

fn pipeline_against(bucket: &MockServer, root: &std::path::Path) -> Pipeline {
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
    let store = storage::connect(&storage_config(&bucket.uri()), client.clone()).unwrap();
    let name = store.bucket().to_string();
    let fetcher = HttpFetcher::new(client.clone(), Duration::from_secs(2));
    let resolver = ArchiveResolver::new(client, Default::default());

    Pipeline::new(Arc::new(fetcher), resolver, Arc::new(store), name)
        .with_workspace_root(Some(root.to_path_buf()))
}

#[tokio::test]
async fn test_pages_are_put_with_signature_and_public_acl() {
    let site = MockServer::start().await;
    let bucket = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/guide">Guide</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Guide</h1>"))
        .mount(&site)
        .await;

    Mock::given(method("PUT"))
        .and(header("x-amz-acl", "public-read"))
        .and(header("content-type", "text/markdown"))
        // Matches the whole value as well as each comma-separated part
        .and(header_regex(
            "authorization",
            r"^\s*(AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\d{8}/auto/s3/aws4_request|SignedHeaders=content-type;host;x-amz-acl;x-amz-content-sha256;x-amz-date|Signature=[0-9a-f]{64})(,|$)",
        ))
        .and(header_exists("x-amz-content-sha256"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&bucket)
        .await;

    let pipeline = pipeline_against(&bucket, root.path());
    let report = pipeline
        .run_site_job(&site.uri(), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.files, vec!["index.md", "guide.md"]);

    let puts = bucket.received_requests().await.unwrap();
    let paths: Vec<&str> = puts.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/site-docs/index.md", "/site-docs/guide.md"]);
}

#[tokio::test]
async fn test_bucket_error_stops_job_at_upload_stage() {
    let site = MockServer::start().await;
    let bucket = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>only page</p>"))
        .mount(&site)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<Error>AccessDenied</Error>"))
        .mount(&bucket)
        .await;

    let pipeline = pipeline_against(&bucket, root.path());
    let err = pipeline
        .run_site_job(&site.uri(), None, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Upload);
    assert!(err.source.to_string().contains("index.md"));
    assert!(std::fs::read_dir(root.path()).unwrap().next().is_none());
}
