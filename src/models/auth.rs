use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The resolved caller, inserted as a request extension by the auth middleware
/// and threaded explicitly into services from there.
#[derive(Debug, Clone)]
pub struct AuthenticatedEmployee {
    pub employee_id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
}
