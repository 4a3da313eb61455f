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
use crate::models::brand::{Brand, CreateBrandRequest, UpdateBrandRequest};
use crate::permissions::perm;
use crate::services::brand_service::{BrandError, BrandService};

impl IntoResponse for BrandError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            BrandError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            BrandError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BrandError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing brands
#[utoipa::path(
    get,
    path = "/api/brands",
    responses(
        (status = 200, description = "List of brands", body = Vec<Brand>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "brands"
)]
pub async fn list_brands_handler(
    State(brand_service): State<Arc<dyn BrandService>>,
) -> Result<Json<Vec<Brand>>, Response> {
    match brand_service.list().await {
        Ok(brands) => Ok(Json(brands)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single brand
#[utoipa::path(
    get,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "The brand", body = Brand),
        (status = 404, description = "Brand not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "brands"
)]
pub async fn get_brand_handler(
    State(brand_service): State<Arc<dyn BrandService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Brand>, Response> {
    match brand_service.get(id).await {
        Ok(brand) => Ok(Json(brand)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a brand
#[utoipa::path(
    post,
    path = "/api/brands",
    request_body = CreateBrandRequest,
    responses(
        (status = 201, description = "Brand successfully created", body = Brand),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "brands"
)]
pub async fn create_brand_handler(
    State(brand_service): State<Arc<dyn BrandService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<Brand>), Response> {
    require(&employee, perm::BRANDS_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match brand_service.create(&ctx, request).await {
        Ok(brand) => Ok((StatusCode::CREATED, Json(brand))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a brand
#[utoipa::path(
    put,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = UpdateBrandRequest,
    responses(
        (status = 200, description = "Brand successfully updated", body = Brand),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Brand not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "brands"
)]
pub async fn update_brand_handler(
    State(brand_service): State<Arc<dyn BrandService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBrandRequest>,
) -> Result<Json<Brand>, Response> {
    require(&employee, perm::BRANDS_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match brand_service.update(&ctx, id, request).await {
        Ok(brand) => Ok(Json(brand)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a brand
#[utoipa::path(
    delete,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 204, description = "Brand successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Brand not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "brands"
)]
pub async fn delete_brand_handler(
    State(brand_service): State<Arc<dyn BrandService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::BRANDS_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match brand_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
