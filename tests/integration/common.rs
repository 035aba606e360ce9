use async_trait::async_trait;
use bucket_ferry::archive::ArchiveResolver;
use bucket_ferry::config::{ArchiveConfig, UserAgentConfig};
use bucket_ferry::crawler::{build_http_client, HttpFetcher};
use bucket_ferry::storage::{ObjectStore, PutObject, StorageError, StorageResult};
use bucket_ferry::Pipeline;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One committed upload
#[derive(Debug, Clone)]
pub struct Stored {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store; optionally rejects one key
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<Stored>>,
    pub reject: Option<String>,
}

impl MemoryStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.key.clone())
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Stored> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.key == key)
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, object: PutObject<'_>) -> StorageResult<()> {
        if self.reject.as_deref() == Some(object.key) {
            return Err(StorageError::Status {
                key: object.key.to_string(),
                status: 503,
                body: "SlowDown".to_string(),
            });
        }
        self.objects.lock().unwrap().push(Stored {
            key: object.key.to_string(),
            body: object.body,
            content_type: object.content_type.to_string(),
        });
        Ok(())
    }
}

/// A pipeline using real HTTP against `archive_base` and an in-memory store
pub fn pipeline(archive_base: &str, store: Arc<MemoryStore>, root: &Path) -> Pipeline {
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
    let fetcher = HttpFetcher::new(client.clone(), Duration::from_secs(2));
    let resolver = ArchiveResolver::new(
        client,
        ArchiveConfig {
            download_base: archive_base.to_string(),
            download_timeout_secs: 5,
            ..ArchiveConfig::default()
        },
    );

    Pipeline::new(Arc::new(fetcher), resolver, store, "docs")
        .with_workspace_root(Some(root.to_path_buf()))
}

/// True when no job workspace is left under `root`
pub fn no_workspaces_left(root: &Path) -> bool {
    std::fs::read_dir(root).unwrap().next().is_none()
}
