use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use keepsake_core::{BlobError, BlobFile, BlobStore, StoredBlob};

/// Stores blobs in Vercel Blob, a managed object storage with public URLs.
pub struct VercelBlobStore {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

impl VercelBlobStore {
    pub const DEFAULT_URL: &'static str = "https://blob.vercel-storage.com";
    const API_VERSION: &'static str = "7";

    pub fn new<S, T>(base_url: S, token: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        let base_url: String = base_url.into();

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl BlobStore for VercelBlobStore {
    async fn put(&self, key: &str, file: BlobFile) -> Result<StoredBlob, BlobError> {
        let url = format!("{}/{}", self.base_url, key);
        let size = file.bytes.len();

        let mut request = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("x-api-version", Self::API_VERSION);

        if let Some(content_type) = &file.content_type {
            request = request.header("x-content-type", content_type);
        }

        let response = request
            .body(file.bytes)
            .send()
            .await
            .map_err(|e| BlobError::Transport(Box::new(e)))?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();

            return Err(BlobError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: PutResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Transport(Box::new(e)))?;

        debug!("Stored {} bytes as {}", size, body.url);

        Ok(StoredBlob {
            key: key.to_string(),
            url: body.url,
        })
    }
}
