use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::ErrorResponse;
use crate::models::audit::{AuditEntry, AuditLogFilter};
use crate::services::audit_service::{AuditLogError, AuditLogService};

impl IntoResponse for AuditLogError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new("PERSISTENCE_ERROR", &self.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Handler for listing audit entries
///
/// Read-only: the trail is append-only and no mutation surface exists.
#[utoipa::path(
    get,
    path = "/api/audit",
    params(
        ("target_model" = Option<String>, Query, description = "Filter by target model"),
        ("actor_id" = Option<Uuid>, Query, description = "Filter by actor"),
        ("from" = Option<String>, Query, description = "Inclusive lower bound (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Inclusive upper bound (RFC 3339)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 50, max 500)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditEntry>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "audit"
)]
pub async fn list_audit_handler(
    State(audit_log_service): State<Arc<dyn AuditLogService>>,
    Query(filter): Query<AuditLogFilter>,
) -> Result<Json<Vec<AuditEntry>>, Response> {
    match audit_log_service.list(filter).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => Err(e.into_response()),
    }
}
