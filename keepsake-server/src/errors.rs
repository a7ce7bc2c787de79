use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keepsake_shop::{AuthError, DatabaseError, OrderError, UploadError};
use log::error;
use thiserror::Error;

use crate::serialized::ErrorMessage;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The client sent something we can't accept
    #[error("{0}")]
    BadRequest(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Authorization must be Bearer")]
    MalformedAuthorization,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MalformedAuthorization => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Unknown(details) => {
                error!("Request failed: {}", details);
                "Internal server error".to_string()
            }
            e => e.to_string(),
        };

        (self.as_status_code(), Json(ErrorMessage { message })).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::InvalidSession => Self::Unauthorized,
            AuthError::UsernameTaken(_) => Self::BadRequest(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<OrderError> for ServerError {
    fn from(value: OrderError) -> Self {
        match value {
            OrderError::NotFound(_) => Self::NotFound(value.to_string()),
            OrderError::Db(e) => e.into(),
            e => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<UploadError> for ServerError {
    fn from(value: UploadError) -> Self {
        match value {
            UploadError::TooLarge { size: _ } => Self::BadRequest(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier: _,
            } => Self::NotFound(format!("{} not found", resource)),
            DatabaseError::Conflict { .. } => Self::BadRequest(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}
