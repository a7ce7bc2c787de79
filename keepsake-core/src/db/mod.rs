use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

mod data;
pub use data::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type SharedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can store users, sessions, and orders.
///
/// Every backend must honor the same semantics, so the server can't tell
/// which one it's talking to.
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    /// Fails with a conflict if the username is taken
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    /// Deleting a session that doesn't exist is not an error
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn order_by_id(&self, order_id: &str) -> Result<OrderData>;
    /// Returns every order, oldest first
    async fn list_orders(&self) -> Result<Vec<OrderData>>;
    /// Fails with a conflict if the id is taken, leaving the existing order untouched
    async fn create_order(&self, new_order: NewOrder) -> Result<OrderData>;
    /// Attaches files to an order that hasn't been uploaded to yet.
    /// The check and the write happen atomically, a second upload fails with a conflict.
    async fn complete_upload(&self, upload: CompletedUpload) -> Result<OrderData>;
    /// Deleting an order that doesn't exist is not an error
    async fn delete_order(&self, order_id: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    /// Must already be hashed
    pub password: String,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewOrder {
    pub id: String,
}

#[derive(Debug)]
pub struct CompletedUpload {
    pub order_id: String,
    pub files: OrderFiles,
    pub song_request: String,
}
