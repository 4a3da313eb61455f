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
use crate::models::customer::{Customer, UpdateCustomerRequest};
use crate::permissions::perm;
use crate::services::customer_service::{CustomerError, CustomerService};

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            CustomerError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CustomerError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            CustomerError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing customers
#[utoipa::path(
    get,
    path = "/api/customers",
    responses(
        (status = 200, description = "List of customers", body = Vec<Customer>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customers_handler(
    State(customer_service): State<Arc<dyn CustomerService>>,
) -> Result<Json<Vec<Customer>>, Response> {
    match customer_service.list().await {
        Ok(customers) => Ok(Json(customers)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single customer
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "The customer", body = Customer),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn get_customer_handler(
    State(customer_service): State<Arc<dyn CustomerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, Response> {
    match customer_service.get(id).await {
        Ok(customer) => Ok(Json(customer)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a customer (contact data, blocked flag)
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer successfully updated", body = Customer),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn update_customer_handler(
    State(customer_service): State<Arc<dyn CustomerService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, Response> {
    require(&employee, perm::CUSTOMERS_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match customer_service.update(&ctx, id, request).await {
        Ok(customer) => Ok(Json(customer)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a customer
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn delete_customer_handler(
    State(customer_service): State<Arc<dyn CustomerService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::CUSTOMERS_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match customer_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
