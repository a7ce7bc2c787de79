mod auth;
mod orders;
mod uploads;

pub use auth::*;
pub use keepsake_core::*;
pub use orders::*;
pub use uploads::*;

/// The keepsake shop, facilitating orders, uploads, and seller authentication.
pub struct Shop {
    pub auth: Auth,
    pub orders: Orders,
    pub uploads: Uploads,
}

impl Shop {
    pub fn new(database: SharedDatabase, blobs: SharedBlobStore) -> Self {
        Self {
            auth: Auth::new(&database),
            orders: Orders::new(&database),
            uploads: Uploads::new(&blobs),
        }
    }
}
