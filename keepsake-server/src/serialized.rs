//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use keepsake_shop::{FileEntry, OrderData, OrderFiles, SessionData, StoredBlob, UserData};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    id: i32,
    username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    has_uploaded: bool,
    files: Option<Files>,
    song_request: String,
    created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Files {
    videos: Vec<File>,
    images: Vec<File>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct File {
    name: String,
    url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResult {
    url: String,
}

/// The body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorMessage {
    pub message: String,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Order> for OrderData {
    fn to_serialized(&self) -> Order {
        Order {
            id: self.id.clone(),
            has_uploaded: self.has_uploaded,
            files: self.files.as_ref().map(|f| f.to_serialized()),
            song_request: self.song_request.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

impl ToSerialized<Files> for OrderFiles {
    fn to_serialized(&self) -> Files {
        Files {
            videos: self.videos.to_serialized(),
            images: self.images.to_serialized(),
        }
    }
}

impl ToSerialized<File> for FileEntry {
    fn to_serialized(&self) -> File {
        File {
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }
}

impl ToSerialized<UploadResult> for StoredBlob {
    fn to_serialized(&self) -> UploadResult {
        UploadResult {
            url: self.url.clone(),
        }
    }
}
