use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One immutable row of the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    /// `"<entity>.<verb>"`, e.g. `category.update`.
    pub action: String,
    pub target_model: String,
    /// Present for every `success` entry; may be absent on `failure`.
    pub target_id: Option<Uuid>,
    /// Field name to `{"oldValue": .., "newValue": ..}` map; only fields that
    /// actually differ appear. Consumed verbatim by the audit viewer.
    pub changes: serde_json::Value,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

/// Everything the recorder needs besides the persistence timestamp.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub target_model: String,
    pub target_id: Option<Uuid>,
    pub changes: serde_json::Value,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
}

/// Who performed the mutation and where the request came from. Built in the
/// handler from the authenticated employee and the request headers, and passed
/// explicitly into every service mutation.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Query filter for the audit listing endpoint.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AuditLogFilter {
    pub target_model: Option<String>,
    pub actor_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
