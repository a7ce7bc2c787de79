use log::{error, info};
use thiserror::Error;

use keepsake_core::{random_string, BlobError, BlobFile, SharedBlobStore, StoredBlob};

/// The largest file a customer can upload, in bytes
pub const MAX_FILE_SIZE: usize = 3 * 1024 * 1024;

/// Forwards customer files to the blob store
pub struct Uploads {
    blobs: SharedBlobStore,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File size cannot exceed 3MB")]
    TooLarge { size: usize },
    #[error(transparent)]
    Blob(#[from] BlobError),
}

impl Uploads {
    const KEY_LENGTH: usize = 32;

    pub fn new(blobs: &SharedBlobStore) -> Self {
        Self {
            blobs: blobs.clone(),
        }
    }

    /// Stores a file under a random key, returning its public URL
    pub async fn upload(&self, file: BlobFile) -> Result<StoredBlob, UploadError> {
        let size = file.bytes.len();

        if size > MAX_FILE_SIZE {
            return Err(UploadError::TooLarge { size });
        }

        let key = random_string(Self::KEY_LENGTH);

        let blob = self.blobs.put(&key, file).await.map_err(|e| {
            error!("Blob store failed to store {}: {}", key, e);
            UploadError::from(e)
        })?;

        info!("Uploaded {} bytes to {}", size, blob.url);
        Ok(blob)
    }
}
