use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use keepsake_shop::{FileEntry, OrderUpload};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 128))]
    pub username: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 128))]
    pub username: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderSchema {
    /// Trimmed and bounded by the shop
    #[validate(length(min = 1))]
    pub id: String,
}

/// The customer's submission for an order.
/// Missing fields default to empty.
#[derive(Debug, Default, ToSchema, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOrderSchema {
    pub videos: Vec<FileSchema>,
    pub images: Vec<FileSchema>,
    pub song_request: String,
}

#[derive(Debug, Default, ToSchema, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchema {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderSearchQuery {
    /// Only return orders whose id contains this, ignoring case
    pub search: Option<String>,
}

impl From<UploadOrderSchema> for OrderUpload {
    fn from(value: UploadOrderSchema) -> Self {
        Self {
            videos: value.videos.into_iter().map(FileEntry::from).collect(),
            images: value.images.into_iter().map(FileEntry::from).collect(),
            song_request: value.song_request,
        }
    }
}

/// An unparsed [UploadOrderSchema].
/// It is only parsed after the order is found and known to accept uploads.
pub struct UploadBody(pub Bytes);

impl TryFrom<UploadBody> for OrderUpload {
    type Error = String;

    fn try_from(value: UploadBody) -> Result<Self, Self::Error> {
        let Json(schema) =
            Json::<UploadOrderSchema>::from_bytes(&value.0).map_err(|e| e.body_text())?;

        Ok(schema.into())
    }
}

impl From<FileSchema> for FileEntry {
    fn from(value: FileSchema) -> Self {
        Self {
            name: value.name,
            url: value.url,
        }
    }
}

/// Like [Json], but rejects with a JSON error message
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;

        Ok(Self(value))
    }
}

/// Parses and validates a JSON body
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;

        value
            .validate()
            .map_err(|e| ServerError::BadRequest(format!("Request body is invalid: {}", e)))?;

        Ok(Self(value))
    }
}
