//! Publishing a file set to object storage
//!
//! Uploads run one at a time in manifest order and stop at the first failure.
//! Whatever happens, the job's [`Workspace`] is removed before [`Publisher::publish`]
//! returns.

use crate::archive::RepoTree;
use crate::convert::WrittenArtifact;
use crate::storage::{ObjectAcl, ObjectStore, PutObject};
use crate::workspace::Workspace;
use crate::FerryError;
use std::path::PathBuf;
use std::sync::Arc;

/// Content type of converted pages
pub const MARKDOWN: &str = "text/markdown";

/// Content type of repository files
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub key: String,
    pub local_path: PathBuf,
    pub content_type: &'static str,
}

/// Ordered list of files to upload
#[derive(Debug, Clone, Default)]
pub struct UploadManifest {
    items: Vec<UploadItem>,
}

impl UploadManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, local_path: PathBuf, content_type: &'static str) {
        self.items.push(UploadItem {
            key: key.into(),
            local_path,
            content_type,
        });
    }

    /// Manifest for converted pages, keyed by their file names
    pub fn from_artifacts(artifacts: &[WrittenArtifact]) -> Self {
        let mut manifest = Self::new();
        for artifact in artifacts {
            manifest.push(
                artifact.relative_path.clone(),
                artifact.local_path.clone(),
                MARKDOWN,
            );
        }
        manifest
    }

    /// Manifest for an unpacked repository, keyed `<repo>/<path>`
    pub fn from_tree(tree: &RepoTree) -> Self {
        let mut manifest = Self::new();
        for file in &tree.files {
            manifest.push(tree.storage_key(file), tree.root.join(file), OCTET_STREAM);
        }
        manifest
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Uploads manifests through an [`ObjectStore`]
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    acl: ObjectAcl,
}

impl Publisher {
    /// A publisher writing `public-read` objects
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            acl: ObjectAcl::PublicRead,
        }
    }

    /// Uploads every item in order, then removes `workspace`
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Keys committed, in manifest order
    /// * `Err(FerryError::NothingUploaded)` - The manifest was empty
    /// * `Err(FerryError::Upload | ReadArtifact)` - The first item that failed;
    ///   later items were never attempted
    pub async fn publish(
        &self,
        manifest: &UploadManifest,
        bucket: &str,
        workspace: Workspace,
    ) -> Result<Vec<String>, FerryError> {
        let result = self.upload_all(manifest, bucket).await;
        workspace.cleanup();
        result
    }

    async fn upload_all(
        &self,
        manifest: &UploadManifest,
        bucket: &str,
    ) -> Result<Vec<String>, FerryError> {
        if manifest.is_empty() {
            return Err(FerryError::NothingUploaded);
        }

        let mut uploaded = Vec::with_capacity(manifest.len());

        for item in manifest.items() {
            let body = tokio::fs::read(&item.local_path)
                .await
                .map_err(|source| FerryError::ReadArtifact {
                    key: item.key.clone(),
                    source,
                })?;

            let size = body.len();
            self.store
                .put_object(PutObject {
                    bucket,
                    key: &item.key,
                    body,
                    content_type: item.content_type,
                    acl: self.acl,
                })
                .await
                .map_err(|source| {
                    tracing::error!("Failed to upload {}: {}", item.key, source);
                    FerryError::Upload {
                        key: item.key.clone(),
                        source,
                    }
                })?;

            tracing::info!("Uploaded {} ({} bytes) to {}", item.key, size, bucket);
            uploaded.push(item.key.clone());
        }

        Ok(uploaded)
    }
}
