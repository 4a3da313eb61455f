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
use crate::models::shipping::{CreateShippingRequest, ShippingZone, UpdateShippingRequest};
use crate::permissions::perm;
use crate::services::shipping_service::{ShippingError, ShippingService};

impl IntoResponse for ShippingError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            ShippingError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ShippingError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ShippingError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing shipping zones
#[utoipa::path(
    get,
    path = "/api/shipping",
    responses(
        (status = 200, description = "List of shipping zones", body = Vec<ShippingZone>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shipping"
)]
pub async fn list_shipping_handler(
    State(shipping_service): State<Arc<dyn ShippingService>>,
) -> Result<Json<Vec<ShippingZone>>, Response> {
    match shipping_service.list().await {
        Ok(zones) => Ok(Json(zones)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a shipping zone
#[utoipa::path(
    post,
    path = "/api/shipping",
    request_body = CreateShippingRequest,
    responses(
        (status = 201, description = "Shipping zone successfully created", body = ShippingZone),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shipping"
)]
pub async fn create_shipping_handler(
    State(shipping_service): State<Arc<dyn ShippingService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateShippingRequest>,
) -> Result<(StatusCode, Json<ShippingZone>), Response> {
    require(&employee, perm::SHIPPING_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match shipping_service.create(&ctx, request).await {
        Ok(zone) => Ok((StatusCode::CREATED, Json(zone))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a shipping zone
#[utoipa::path(
    put,
    path = "/api/shipping/{id}",
    params(("id" = Uuid, Path, description = "Shipping zone ID")),
    request_body = UpdateShippingRequest,
    responses(
        (status = 200, description = "Shipping zone successfully updated", body = ShippingZone),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Shipping zone not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shipping"
)]
pub async fn update_shipping_handler(
    State(shipping_service): State<Arc<dyn ShippingService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateShippingRequest>,
) -> Result<Json<ShippingZone>, Response> {
    require(&employee, perm::SHIPPING_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match shipping_service.update(&ctx, id, request).await {
        Ok(zone) => Ok(Json(zone)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a shipping zone
#[utoipa::path(
    delete,
    path = "/api/shipping/{id}",
    params(("id" = Uuid, Path, description = "Shipping zone ID")),
    responses(
        (status = 204, description = "Shipping zone successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Shipping zone not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shipping"
)]
pub async fn delete_shipping_handler(
    State(shipping_service): State<Arc<dyn ShippingService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::SHIPPING_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match shipping_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
