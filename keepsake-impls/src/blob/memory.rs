use async_trait::async_trait;
use dashmap::DashMap;

use keepsake_core::{BlobError, BlobFile, BlobStore, StoredBlob};

/// Keeps blobs in memory, for development and tests.
/// The returned URLs aren't reachable from anywhere.
pub struct MemoryBlobStore {
    base_url: String,
    blobs: DashMap<String, BlobFile>,
}

impl MemoryBlobStore {
    pub const DEFAULT_URL: &'static str = "memory://blobs";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_URL)
    }

    pub fn with_base_url<S>(base_url: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            base_url: base_url.into(),
            blobs: Default::default(),
        }
    }

    /// Returns a stored blob by key
    pub fn get(&self, key: &str) -> Option<BlobFile> {
        self.blobs.get(key).map(|b| b.value().clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, file: BlobFile) -> Result<StoredBlob, BlobError> {
        self.blobs.insert(key.to_string(), file);

        Ok(StoredBlob {
            key: key.to_string(),
            url: format!("{}/{}", self.base_url, key),
        })
    }
}
