use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{auth, orders, schemas, serialized, uploads};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::user,
        auth::register,
        auth::login,
        auth::logout,
        orders::create_order,
        orders::list_orders,
        orders::order,
        orders::upload_to_order,
        orders::delete_order,
        uploads::upload,
    ),
    components(schemas(
        schemas::LoginSchema,
        schemas::RegisterSchema,
        schemas::NewOrderSchema,
        schemas::UploadOrderSchema,
        schemas::FileSchema,
        serialized::User,
        serialized::LoginResult,
        serialized::Order,
        serialized::Files,
        serialized::File,
        serialized::UploadResult,
        serialized::ErrorMessage,
    )),
    modifiers(&Security),
    info(description = "keepsake-server exposes endpoints to submit and manage keepsake orders")
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
