//! Job-scoped scratch directories
//!
//! A [`Workspace`] owns one uniquely named temporary directory. It is removed
//! exactly once: either explicitly through [`Workspace::cleanup`] or, on any
//! early return, when the value is dropped. Removal problems are logged and
//! never reported to the caller.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A uniquely named temporary directory owned by one job
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Creates a workspace in the system temp directory
    pub fn create() -> io::Result<Self> {
        Self::wrap(tempfile::Builder::new().prefix("ferry-").tempdir()?)
    }

    /// Creates a workspace inside `root`, creating `root` if needed
    pub fn create_in(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        Self::wrap(tempfile::Builder::new().prefix("ferry-").tempdir_in(root)?)
    }

    fn wrap(dir: TempDir) -> io::Result<Self> {
        let path = dir.path().to_path_buf();
        tracing::debug!("Created workspace {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// The workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Joins `relative` onto the workspace directory
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Removes the workspace and everything under it
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => tracing::info!("Deleted temporary directory: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Workspace {} was already removed", self.path.display())
            }
            Err(e) => tracing::error!(
                "Failed to delete temp directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
