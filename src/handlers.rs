pub mod audit_handlers;
pub mod auth_handlers;
pub mod brand_handlers;
pub mod category_handlers;
pub mod customer_handlers;
pub mod employee_handlers;
pub mod hero_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
pub mod shipping_handlers;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::models::audit::AuditContext;
use crate::models::auth::AuthenticatedEmployee;
use crate::middleware::request_meta::RequestMeta;
use crate::permissions::{PermissionGate, WildcardGate};

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Checks the caller's permission set before anything else runs; a denial
/// never reaches the service or the store.
pub fn require(employee: &AuthenticatedEmployee, permission: &str) -> Result<(), Response> {
    if WildcardGate.allows(&employee.permissions, permission) {
        return Ok(());
    }
    let body = ErrorResponse::new(
        "FORBIDDEN",
        &format!("Missing required permission: {}", permission),
    );
    Err((StatusCode::FORBIDDEN, Json(body)).into_response())
}

/// The actor parameter every service mutation takes, built from the
/// authenticated employee and the request headers.
pub fn audit_context(employee: &AuthenticatedEmployee, meta: &RequestMeta) -> AuditContext {
    AuditContext {
        actor_id: employee.employee_id,
        actor_name: employee.name.clone(),
        ip_address: meta.ip_address.clone(),
        user_agent: meta.user_agent.clone(),
    }
}

/// Flattens `validator` errors into one `VALIDATION_ERROR` response.
pub fn validation_error_response(validation_errors: ValidationErrors) -> Response {
    let message = validation_errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ");

    let body = ErrorResponse::new("VALIDATION_ERROR", &message);
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
