//! Repository archive source
//!
//! The alternate source pipeline: a GitHub repository URL is validated,
//! its branch archive is streamed into the job workspace, unpacked, and the
//! resulting tree listed for publishing.
//!
//! # Flow
//!
//! 1. Validate the URL shape (no network access before this passes)
//! 2. Download `<base>/<owner>/<repo>/archive/refs/heads/<branch>.zip`
//! 3. Extract it and delete the zip right away
//! 4. Locate `<repo>-<branch>/` (or the lone top-level directory) and list its files

mod extract;
mod repo;

pub use extract::{extract_zip, list_files};
pub use repo::RepoRef;

use crate::config::ArchiveConfig;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Errors from the archive source
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidRepoUrl { url: String, reason: String },

    #[error("Failed to download {url}: HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("Failed to extract archive: {0}")]
    Extraction(String),

    #[error("Expected directory '{expected}' not found in archive")]
    MissingRoot { expected: String },
}

impl ArchiveError {
    /// True for errors caused by the submitted URL rather than the fetch
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidRepoUrl { .. })
    }
}

/// An unpacked repository inside the workspace
#[derive(Debug, Clone)]
pub struct RepoTree {
    pub repo: RepoRef,

    /// The archive's top-level directory
    pub root: PathBuf,

    /// Regular files relative to `root`, sorted
    pub files: Vec<PathBuf>,
}

impl RepoTree {
    /// Storage key for a file: `<repo>/<path with forward slashes>`
    pub fn storage_key(&self, relative: &Path) -> String {
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.repo.repo, path)
    }
}

/// Resolves repository URLs to unpacked trees
#[derive(Debug, Clone)]
pub struct ArchiveResolver {
    client: Client,
    config: ArchiveConfig,
}

impl ArchiveResolver {
    pub fn new(client: Client, config: ArchiveConfig) -> Self {
        Self { client, config }
    }

    pub fn branch(&self) -> &str {
        &self.config.branch
    }

    /// Downloads and unpacks `repo_url` into `workspace`
    ///
    /// # Returns
    ///
    /// * `Ok(RepoTree)` - Archive unpacked; the zip itself is already gone
    /// * `Err(ArchiveError::InvalidRepoUrl)` - Rejected before any request
    /// * `Err(ArchiveError::Download*)` - Non-success status or transport error
    /// * `Err(ArchiveError::Extraction | MissingRoot)` - Bad or unexpected archive
    pub async fn resolve(&self, repo_url: &str, workspace: &Path) -> Result<RepoTree, ArchiveError> {
        let repo = RepoRef::parse(repo_url)?;
        self.fetch(repo, workspace).await
    }

    /// Downloads and unpacks an already validated repository
    pub async fn fetch(&self, repo: RepoRef, workspace: &Path) -> Result<RepoTree, ArchiveError> {
        let branch = &self.config.branch;
        let archive_url = repo.archive_url(&self.config.download_base, branch);
        let root_name = repo.root_dir_name(branch);

        let archive_path = workspace.join(format!("{}.zip", root_name));
        let extract_dir = workspace.join("extracted");

        tracing::info!("Downloading {}/{} ({}) from {}", repo.owner, repo.repo, branch, archive_url);
        let bytes = self.download(&archive_url, &archive_path).await?;
        tracing::info!("Downloaded {} bytes to {}", bytes, archive_path.display());

        let (zip, dest) = (archive_path.clone(), extract_dir.clone());
        tokio::task::spawn_blocking(move || extract_zip(&zip, &dest))
            .await
            .map_err(|e| ArchiveError::Extraction(format!("extraction task failed: {}", e)))??;

        match tokio::fs::remove_file(&archive_path).await {
            Ok(()) => tracing::debug!("Deleted archive {}", archive_path.display()),
            Err(e) => tracing::warn!("Failed to delete archive {}: {}", archive_path.display(), e),
        }

        let root = locate_root(&extract_dir, root_name).await?;

        let listing_root = root.clone();
        let files = tokio::task::spawn_blocking(move || list_files(&listing_root))
            .await
            .map_err(|e| ArchiveError::Extraction(format!("listing task failed: {}", e)))?
            .map_err(|e| ArchiveError::Extraction(format!("cannot list {}: {}", root.display(), e)))?;

        tracing::info!("Extracted {} files from {}/{}", files.len(), repo.owner, repo.repo);

        Ok(RepoTree { repo, root, files })
    }

    /// Streams `url` into `dest` through a fixed-size buffer
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, ArchiveError> {
        let download_error = |message: String| ArchiveError::Download {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.config.download_timeout_secs))
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| download_error(format!("cannot create {}: {}", dest.display(), e)))?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, file);
        let mut total = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_error(e.to_string()))?
        {
            total += chunk.len() as u64;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| download_error(e.to_string()))?;
        }

        writer
            .flush()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        Ok(total)
    }
}

/// Finds the archive's top-level directory
///
/// GitHub names it after the repository's canonical casing, which the
/// submitted URL need not share. When `expected` is absent, a lone
/// top-level directory is taken instead.
async fn locate_root(extract_dir: &Path, expected: String) -> Result<PathBuf, ArchiveError> {
    let exact = extract_dir.join(&expected);
    if tokio::fs::metadata(&exact).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(exact);
    }

    let missing = || ArchiveError::MissingRoot {
        expected: expected.clone(),
    };

    let mut entries = tokio::fs::read_dir(extract_dir).await.map_err(|_| missing())?;
    let mut top_level = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|_| missing())? {
        top_level.push(entry);
    }

    match top_level.as_slice() {
        [only] if only.file_type().await.map(|t| t.is_dir()).unwrap_or(false) => {
            tracing::debug!(
                "Archive root is '{}' rather than '{}'",
                only.file_name().to_string_lossy(),
                expected
            );
            Ok(only.path())
        }
        _ => Err(missing()),
    }
}
