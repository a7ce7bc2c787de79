use std::fmt::Display;

use log::info;
use thiserror::Error;
use url::Url;

use keepsake_core::{
    CompletedUpload, DatabaseError, FileEntry, NewOrder, OrderData, OrderFiles, SharedDatabase,
};

/// Manages the lifecycle of customer orders: created, uploaded to once, then deleted.
pub struct Orders {
    db: SharedDatabase,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order ID already exists")]
    AlreadyExists(String),
    #[error("Order not found")]
    NotFound(String),
    #[error("Order already has uploads")]
    AlreadyUploaded(String),
    #[error("Invalid order ID: {0}")]
    InvalidId(String),
    #[error("Invalid upload data: {0}")]
    InvalidUpload(String),
    #[error(transparent)]
    Db(DatabaseError),
}

/// What a customer submits for their order
#[derive(Debug, Clone)]
pub struct OrderUpload {
    pub videos: Vec<FileEntry>,
    pub images: Vec<FileEntry>,
    pub song_request: String,
}

impl Orders {
    pub const MAX_ID_LENGTH: usize = 128;

    pub fn new(db: &SharedDatabase) -> Self {
        Self { db: db.clone() }
    }

    /// Creates an empty order, failing if the id is taken
    pub async fn create(&self, id: &str) -> Result<OrderData, OrderError> {
        let id = id.trim();

        if id.is_empty() {
            return Err(OrderError::InvalidId("must not be empty".to_string()));
        }

        if id.chars().count() > Self::MAX_ID_LENGTH {
            return Err(OrderError::InvalidId(format!(
                "must be at most {} characters",
                Self::MAX_ID_LENGTH
            )));
        }

        let order = self
            .db
            .create_order(NewOrder { id: id.to_string() })
            .await
            .map_err(|e| match e {
                e if e.is_conflict() => OrderError::AlreadyExists(id.to_string()),
                err => OrderError::Db(err),
            })?;

        info!("Created order {}", order.id);
        Ok(order)
    }

    pub async fn get(&self, id: &str) -> Result<OrderData, OrderError> {
        self.db.order_by_id(id).await.map_err(|e| match e {
            e if e.is_not_found() => OrderError::NotFound(id.to_string()),
            err => OrderError::Db(err),
        })
    }

    /// Lists all orders, optionally only those whose id contains `search`
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<OrderData>, OrderError> {
        let orders = self.db.list_orders().await.map_err(OrderError::Db)?;

        let orders = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(search) => orders.into_iter().filter(|o| o.matches(search)).collect(),
            None => orders,
        };

        Ok(orders)
    }

    /// Attaches the customer's files and song request to an order.
    /// This can only happen once per order.
    ///
    /// The upload is only converted once the order is known to accept it,
    /// so a malformed payload never hides a missing or finished order.
    pub async fn upload<U>(&self, id: &str, upload: U) -> Result<OrderData, OrderError>
    where
        U: TryInto<OrderUpload>,
        U::Error: Display,
    {
        let order = self.get(id).await?;

        if order.has_uploaded {
            return Err(OrderError::AlreadyUploaded(order.id));
        }

        let upload: OrderUpload = upload
            .try_into()
            .map_err(|e| OrderError::InvalidUpload(e.to_string()))?;

        upload.validate().map_err(OrderError::InvalidUpload)?;

        let completed = CompletedUpload {
            order_id: order.id,
            files: OrderFiles {
                videos: upload.videos,
                images: upload.images,
            },
            song_request: upload.song_request,
        };

        // The check above is only a fast path, the database settles races
        let order = self
            .db
            .complete_upload(completed)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => OrderError::NotFound(id.to_string()),
                e if e.is_conflict() => OrderError::AlreadyUploaded(id.to_string()),
                err => OrderError::Db(err),
            })?;

        info!(
            "Order {} received {} video(s) and {} image(s)",
            order.id,
            order.files.as_ref().map_or(0, |f| f.videos.len()),
            order.files.as_ref().map_or(0, |f| f.images.len()),
        );

        Ok(order)
    }

    /// Deletes an order, doing nothing if it doesn't exist
    pub async fn delete(&self, id: &str) -> Result<(), OrderError> {
        self.db.delete_order(id).await.map_err(OrderError::Db)?;

        info!("Deleted order {}", id);
        Ok(())
    }
}

impl OrderUpload {
    /// Every file needs a name and an absolute URL, and a song must be requested
    pub fn validate(&self) -> Result<(), String> {
        for (kind, files) in [("video", &self.videos), ("image", &self.images)] {
            for (index, file) in files.iter().enumerate() {
                if file.name.trim().is_empty() {
                    return Err(format!("{} {} has no name", kind, index));
                }

                Url::parse(&file.url)
                    .map_err(|e| format!("{} {} has an invalid url: {}", kind, index, e))?;
            }
        }

        if self.song_request.trim().is_empty() {
            return Err("Song request is required".to_string());
        }

        Ok(())
    }
}
