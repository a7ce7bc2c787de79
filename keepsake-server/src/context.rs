use std::sync::Arc;

use axum::extract::FromRef;
use keepsake_shop::Shop;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub shop: Arc<Shop>,
}

impl ServerContext {
    pub fn new(shop: Shop) -> Self {
        Self {
            shop: Arc::new(shop),
        }
    }
}
