//! Durable byte storage for uploaded and generated documents.
//!
//! Generation writes its output through a `DocumentStore` and reads it back
//! to verify the write. `AppState` carries an `Arc<dyn DocumentStore>`; the
//! only backend today is the local filesystem.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `bytes` under `name` and returns the full path written.
    /// Creates the target directory if needed.
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf>;

    /// Reads back the bytes stored at `path`.
    async fn get(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Stores documents as plain files under a single directory.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Stored document");
        Ok(path)
    }

    async fn get(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}
