use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json,
};
use keepsake_shop::{BlobFile, UploadError, MAX_FILE_SIZE};

use crate::{
    errors::{ServerError, ServerResult},
    serialized::{ToSerialized, UploadResult},
    Router, ServerContext,
};

/// The multipart field that carries the file
const FILE_FIELD: &str = "file";

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "uploads",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "A single `file` field, at most 3MB"
    ),
    responses(
        (status = 200, body = UploadResult),
        (status = 400, description = "No file, or the file is too large", body = ErrorMessage),
        (status = 500, description = "The blob store failed", body = ErrorMessage)
    )
)]
async fn upload(
    State(context): State<ServerContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Json<UploadResult>> {
    let mut multipart = multipart.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(from_multipart)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(from_multipart)?;

        let blob = context
            .shop
            .uploads
            .upload(BlobFile {
                bytes: bytes.to_vec(),
                content_type,
            })
            .await?;

        return Ok(Json(blob.to_serialized()));
    }

    Err(ServerError::BadRequest("No file uploaded".to_string()))
}

fn from_multipart(error: MultipartError) -> ServerError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge {
            size: MAX_FILE_SIZE + 1,
        }
        .into()
    } else {
        ServerError::BadRequest(error.body_text())
    }
}

pub fn router() -> Router {
    Router::new().route("/upload", post(upload))
}
