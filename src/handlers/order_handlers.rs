use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{audit_context, require, validation_error_response, ErrorResponse};
use crate::middleware::request_meta::RequestMeta;
use crate::models::auth::AuthenticatedEmployee;
use crate::models::order::{CreateOrderRequest, Order, UpdateOrderRequest};
use crate::permissions::perm;
use crate::services::order_service::{OrderError, OrderService};

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            OrderError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            OrderError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            OrderError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing orders
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "List of orders", body = Vec<Order>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders_handler(
    State(order_service): State<Arc<dyn OrderService>>,
) -> Result<Json<Vec<Order>>, Response> {
    match order_service.list().await {
        Ok(orders) => Ok(Json(orders)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single order
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "The order", body = Order),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order_handler(
    State(order_service): State<Arc<dyn OrderService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, Response> {
    match order_service.get(id).await {
        Ok(order) => Ok(Json(order)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating an order on a customer's behalf
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order successfully created", body = Order),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order_handler(
    State(order_service): State<Arc<dyn OrderService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), Response> {
    require(&employee, perm::ORDERS_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match order_service.create(&ctx, request).await {
        Ok(order) => Ok((StatusCode::CREATED, Json(order))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating an order (status, shipping corrections)
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order successfully updated", body = Order),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_order_handler(
    State(order_service): State<Arc<dyn OrderService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, Response> {
    require(&employee, perm::ORDERS_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match order_service.update(&ctx, id, request).await {
        Ok(order) => Ok(Json(order)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting an order
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn delete_order_handler(
    State(order_service): State<Arc<dyn OrderService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::ORDERS_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match order_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
