//! Repository jobs: download, unpack and publish a branch archive

use crate::common::{no_workspaces_left, pipeline, MemoryStore};
use bucket_ferry::archive::ArchiveError;
use bucket_ferry::{FerryError, Stage};
use std::io::{Cursor, Write};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARCHIVE_PATH: &str = "/owner/project/archive/refs/heads/main.zip";
const REPO_URL: &str = "https://github.com/owner/project";

/// Builds an in-memory zip holding `files` (name, contents)
fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

async fn mount_archive(server: &MockServer, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("content-type", "application/zip"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_repo_job_uploads_every_file() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    mount_archive(
        &server,
        zip_of(&[
            ("project-main/README.md", "# Project"),
            ("project-main/src/lib.rs", "pub fn it() {}"),
            ("project-main/src/bin/cli.rs", "fn main() {}"),
        ]),
    )
    .await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let report = pipeline.run_repo_job(REPO_URL).await.unwrap();

    assert_eq!(
        report.files,
        vec![
            "project/README.md",
            "project/src/bin/cli.rs",
            "project/src/lib.rs"
        ]
    );
    assert_eq!(
        report.message,
        "Successfully uploaded 3 files from owner/project to Cloudflare R2"
    );

    let readme = store.get("project/README.md").unwrap();
    assert_eq!(readme.body, b"# Project");
    assert_eq!(readme.content_type, "application/octet-stream");
    assert!(no_workspaces_left(root.path()));
}

#[tokio::test]
async fn test_invalid_repo_url_makes_no_request() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    for bad in [
        "https://github.com/owner",
        "https://github.com/owner/project/tree/main",
        "http://github.com/owner/project",
        "https://gitlab.com/owner/project",
        "not a url",
    ] {
        let err = pipeline.run_repo_job(bad).await.unwrap_err();
        assert_eq!(err.stage, Stage::Validation, "{bad}");
    }
    assert!(no_workspaces_left(root.path()));
}

#[tokio::test]
async fn test_missing_branch_fails_crawl_stage() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let err = pipeline.run_repo_job(REPO_URL).await.unwrap_err();

    assert_eq!(err.stage, Stage::Crawl);
    assert!(matches!(
        err.source,
        FerryError::Archive(ArchiveError::DownloadStatus { status: 404, .. })
    ));
    assert!(store.keys().is_empty());
    assert!(no_workspaces_left(root.path()));
}

#[tokio::test]
async fn test_unexpected_archive_layout_fails_crawl_stage() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    mount_archive(
        &server,
        zip_of(&[("something-else/README.md", "x"), ("other/README.md", "y")]),
    )
    .await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let err = pipeline.run_repo_job(REPO_URL).await.unwrap_err();

    assert_eq!(err.stage, Stage::Crawl);
    assert!(matches!(
        err.source,
        FerryError::Archive(ArchiveError::MissingRoot { ref expected }) if expected == "project-main"
    ));
    assert!(no_workspaces_left(root.path()));
}

#[tokio::test]
async fn test_corrupt_archive_fails_crawl_stage() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    mount_archive(&server, b"PK\x03\x04 truncated".to_vec()).await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let err = pipeline.run_repo_job(REPO_URL).await.unwrap_err();

    assert_eq!(err.stage, Stage::Crawl);
    assert!(matches!(
        err.source,
        FerryError::Archive(ArchiveError::Extraction(_))
    ));
}

#[tokio::test]
async fn test_empty_repository_fails_upload_stage() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .add_directory(
            "project-main/",
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        )
        .unwrap();
    mount_archive(&server, writer.finish().unwrap().into_inner()).await;

    let store = Arc::new(MemoryStore::default());
    let pipeline = pipeline(&server.uri(), store.clone(), root.path());

    let err = pipeline.run_repo_job(REPO_URL).await.unwrap_err();

    assert_eq!(err.stage, Stage::Upload);
    assert!(matches!(err.source, FerryError::NothingUploaded));
    assert!(no_workspaces_left(root.path()));
}
