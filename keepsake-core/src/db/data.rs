use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A seller account
#[derive(Debug, Clone, PartialEq)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    /// The hashed password, in PHC string format
    pub password: String,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A customer order, keyed by an identifier the customer chose
#[derive(Debug, Clone, PartialEq)]
pub struct OrderData {
    pub id: String,
    /// Set once the customer has submitted their files.
    /// An order can only be uploaded to once.
    pub has_uploaded: bool,
    pub files: Option<OrderFiles>,
    pub song_request: String,
    /// RFC 3339 timestamp with millisecond precision
    pub created_at: String,
}

/// The media attached to an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFiles {
    pub videos: Vec<FileEntry>,
    pub images: Vec<FileEntry>,
}

/// A single uploaded file, already persisted in the blob store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub url: String,
}

impl OrderData {
    /// A fresh order with nothing uploaded yet
    pub fn new(id: String) -> Self {
        Self {
            id,
            has_uploaded: false,
            files: Some(OrderFiles::default()),
            song_request: String::new(),
            created_at: timestamp_now(),
        }
    }

    /// Returns true if the id contains the search term, ignoring case
    pub fn matches(&self, search: &str) -> bool {
        self.id.to_lowercase().contains(&search.to_lowercase())
    }
}

/// Formats the current time the way order timestamps are stored
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
