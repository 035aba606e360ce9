//! Job orchestration
//!
//! Wires the two source pipelines onto the publisher:
//!
//! - website: validate → crawl → convert → upload
//! - repository: validate → download and unpack → upload
//!
//! Each job runs in its own [`Workspace`], created after validation and
//! removed on every exit path. Failures are tagged with the [`Stage`] they
//! happened in.

use crate::archive::{ArchiveError, ArchiveResolver, RepoRef};
use crate::config::Config;
use crate::convert::{convert_pages, Converter, Html2MdConverter};
use crate::crawler::{build_http_client, Coordinator, HttpFetcher, PageFetcher};
use crate::publish::{Publisher, UploadManifest};
use crate::storage::{self, ObjectStore};
use crate::url::{validate_site_url, LinkBase};
use crate::workspace::Workspace;
use crate::FerryError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Pipeline stage a job reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validation,
    Crawl,
    Convert,
    Upload,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Crawl => "crawl",
            Stage::Convert => "convert",
            Stage::Upload => "upload",
            Stage::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// A job failure and the stage it happened in
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct JobError {
    pub stage: Stage,
    #[source]
    pub source: FerryError,
}

impl JobError {
    pub fn new(stage: Stage, source: impl Into<FerryError>) -> Self {
        let source = source.into();
        tracing::error!("Job failed at {} stage: {}", stage, source);
        Self { stage, source }
    }
}

/// Summary of a successful job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub message: String,
    pub files: Vec<String>,
}

/// The stages of both pipelines, built once and shared by every job
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    converter: Arc<dyn Converter>,
    resolver: ArchiveResolver,
    publisher: Publisher,
    bucket: String,
    workspace_root: Option<PathBuf>,
    max_pages: usize,
    link_base: LinkBase,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        resolver: ArchiveResolver,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            converter: Arc::new(Html2MdConverter),
            resolver,
            publisher: Publisher::new(store),
            bucket: bucket.into(),
            workspace_root: None,
            max_pages: 100,
            link_base: LinkBase::default(),
        }
    }

    /// Builds the production pipeline: one HTTP client shared by the
    /// fetcher, the archive resolver and the object store
    pub fn from_config(config: &Config) -> Result<Self, FerryError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.connect_timeout_secs),
        )?;
        let fetcher = HttpFetcher::new(
            client.clone(),
            Duration::from_secs(config.crawler.request_timeout_secs),
        );
        let store = storage::connect(&config.storage, client.clone())?;
        let bucket = store.bucket().to_string();
        let resolver = ArchiveResolver::new(client, config.archive.clone());

        Ok(Self::new(Arc::new(fetcher), resolver, Arc::new(store), bucket)
            .with_max_pages(config.crawler.max_pages)
            .with_link_base(config.crawler.link_base)
            .with_workspace_root(config.server.workspace_root.clone()))
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    /// Directory job workspaces are created in; the system temp dir if `None`
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Page cap used when a job does not name one
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_link_base(mut self, link_base: LinkBase) -> Self {
        self.link_base = link_base;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    fn workspace(&self) -> std::io::Result<Workspace> {
        match &self.workspace_root {
            Some(root) => Workspace::create_in(root),
            None => Workspace::create(),
        }
    }

    /// Crawls a website and publishes it as Markdown
    pub async fn run_site_job(
        &self,
        website_url: &str,
        max_pages: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<JobReport, JobError> {
        let start = validate_site_url(website_url).map_err(|e| JobError::new(Stage::Validation, e))?;
        let max_pages = max_pages.unwrap_or(self.max_pages);
        if max_pages == 0 {
            return Err(JobError::new(
                Stage::Validation,
                FerryError::InvalidRequest("max_pages must be at least 1".to_string()),
            ));
        }

        let workspace = self.workspace().map_err(|e| JobError::new(Stage::Crawl, e))?;

        let report = Coordinator::new(self.fetcher.as_ref(), &start, max_pages, cancel)
            .with_link_base(self.link_base)
            .run()
            .await
            .map_err(|e| JobError::new(Stage::Crawl, e))?;
        tracing::info!(
            "Crawled {} pages from {} ({} failed)",
            report.pages.len(),
            start,
            report.failures.len()
        );

        let artifacts = convert_pages(self.converter.as_ref(), &report.pages, workspace.path())
            .await
            .map_err(|e| JobError::new(Stage::Convert, e))?;

        let manifest = UploadManifest::from_artifacts(&artifacts);
        let files = self
            .publisher
            .publish(&manifest, &self.bucket, workspace)
            .await
            .map_err(|e| JobError::new(Stage::Upload, e))?;

        Ok(JobReport {
            message: format!(
                "Successfully uploaded {} Markdown files to Cloudflare R2",
                files.len()
            ),
            files,
        })
    }

    /// Downloads a GitHub repository archive and publishes its files
    pub async fn run_repo_job(&self, repo_url: &str) -> Result<JobReport, JobError> {
        let repo = RepoRef::parse(repo_url).map_err(|e| JobError::new(Stage::Validation, e))?;

        let workspace = self.workspace().map_err(|e| JobError::new(Stage::Crawl, e))?;

        let tree = self
            .resolver
            .fetch(repo, workspace.path())
            .await
            .map_err(|e| JobError::new(archive_stage(&e), e))?;

        let manifest = UploadManifest::from_tree(&tree);
        let files = self
            .publisher
            .publish(&manifest, &self.bucket, workspace)
            .await
            .map_err(|e| JobError::new(Stage::Upload, e))?;

        Ok(JobReport {
            message: format!(
                "Successfully uploaded {} files from {}/{} to Cloudflare R2",
                files.len(),
                tree.repo.owner,
                tree.repo.repo
            ),
            files,
        })
    }
}

fn archive_stage(error: &ArchiveError) -> Stage {
    if error.is_validation() {
        Stage::Validation
    } else {
        Stage::Crawl
    }
}
