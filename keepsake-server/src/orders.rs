use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};

use crate::{
    auth::Session,
    errors::ServerResult,
    schemas::{NewOrderSchema, OrderSearchQuery, UploadBody, ValidatedJson},
    serialized::{Order, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body = NewOrderSchema,
    responses(
        (status = 201, body = Order),
        (status = 400, description = "The order id is taken or invalid", body = ErrorMessage)
    )
)]
async fn create_order(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewOrderSchema>,
) -> ServerResult<(StatusCode, Json<Order>)> {
    let order = context.shop.orders.create(&body.id).await?;

    Ok((StatusCode::CREATED, Json(order.to_serialized())))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    params(OrderSearchQuery),
    security(("BearerAuth" = [])),
    responses(
        (status = 200, body = Vec<Order>),
        (status = 401, body = ErrorMessage)
    )
)]
async fn list_orders(
    _session: Session,
    State(context): State<ServerContext>,
    Query(query): Query<OrderSearchQuery>,
) -> ServerResult<Json<Vec<Order>>> {
    let orders = context.shop.orders.list(query.search.as_deref()).await?;

    Ok(Json(orders.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "orders",
    params(("id" = String, Path, description = "The order id")),
    security(("BearerAuth" = [])),
    responses(
        (status = 200, body = Order),
        (status = 401, body = ErrorMessage),
        (status = 404, body = ErrorMessage)
    )
)]
async fn order(
    _session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Order>> {
    let order = context.shop.orders.get(&id).await?;

    Ok(Json(order.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/upload",
    tag = "orders",
    params(("id" = String, Path, description = "The order id")),
    request_body = crate::schemas::UploadOrderSchema,
    responses(
        (status = 200, body = Order),
        (status = 400, description = "Already uploaded, or the upload is invalid", body = ErrorMessage),
        (status = 404, body = ErrorMessage)
    )
)]
async fn upload_to_order(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> ServerResult<Json<Order>> {
    let order = context.shop.orders.upload(&id, UploadBody(body)).await?;

    Ok(Json(order.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "orders",
    params(("id" = String, Path, description = "The order id")),
    security(("BearerAuth" = [])),
    responses(
        (status = 204, description = "The order is gone, whether it existed or not"),
        (status = 401, body = ErrorMessage)
    )
)]
async fn delete_order(
    _session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    context.shop.orders.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(order).delete(delete_order))
        .route("/orders/:id/upload", post(upload_to_order))
}
