use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub type SharedBlobStore = Arc<dyn BlobStore>;

#[derive(Debug, Error)]
pub enum BlobError {
    /// The store answered, but refused the object
    #[error("Blob store rejected the upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The store could not be reached, or answered with garbage
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

/// A file on its way to the blob store
#[derive(Debug, Clone)]
pub struct BlobFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// An object that was stored successfully
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub key: String,
    /// A publicly accessible URL for the object
    pub url: String,
}

/// Represents an object storage service that hands out public URLs
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, file: BlobFile) -> Result<StoredBlob, BlobError>;
}
