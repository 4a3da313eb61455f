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
use crate::models::product::{CreateProductRequest, Product, UpdateProductRequest};
use crate::permissions::perm;
use crate::services::product_service::{ProductError, ProductService};

/// Convert ProductError to HTTP response
impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            ProductError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ProductError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ProductError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "List of products", body = Vec<Product>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn list_products_handler(
    State(product_service): State<Arc<dyn ProductService>>,
) -> Result<Json<Vec<Product>>, Response> {
    match product_service.list().await {
        Ok(products) => Ok(Json(products)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn get_product_handler(
    State(product_service): State<Arc<dyn ProductService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, Response> {
    match product_service.get(id).await {
        Ok(product) => Ok(Json(product)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product successfully created", body = Product),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product_handler(
    State(product_service): State<Arc<dyn ProductService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), Response> {
    require(&employee, perm::PRODUCTS_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match product_service.create(&ctx, request).await {
        Ok(product) => Ok((StatusCode::CREATED, Json(product))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product successfully updated", body = Product),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product_handler(
    State(product_service): State<Arc<dyn ProductService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, Response> {
    require(&employee, perm::PRODUCTS_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match product_service.update(&ctx, id, request).await {
        Ok(product) => Ok(Json(product)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product_handler(
    State(product_service): State<Arc<dyn ProductService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::PRODUCTS_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match product_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
