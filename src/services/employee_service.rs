use async_trait::async_trait;
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::employee::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
use crate::repositories::employee_repository::EmployeeRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "Employee";

/// Employee service errors
#[derive(Debug, thiserror::Error)]
pub enum EmployeeError {
    #[error("Employee not found")]
    NotFound,

    #[error("An employee with this email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for EmployeeError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => EmployeeError::NotFound,
            RepositoryError::ConstraintViolation(_) => EmployeeError::DuplicateEmail,
            RepositoryError::DatabaseError(msg) => EmployeeError::DatabaseError(msg),
        }
    }
}

#[async_trait]
pub trait EmployeeService: Send + Sync {
    async fn list(&self) -> Result<Vec<Employee>, EmployeeError>;
    async fn get(&self, id: Uuid) -> Result<Employee, EmployeeError>;
    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateEmployeeRequest,
    ) -> Result<Employee, EmployeeError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateEmployeeRequest,
    ) -> Result<Employee, EmployeeError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), EmployeeError>;
}

/// Implementation of EmployeeService
pub struct EmployeeServiceImpl {
    repository: Arc<dyn EmployeeRepository>,
    audit: Arc<AuditRecorder>,
}

impl EmployeeServiceImpl {
    pub fn new(repository: Arc<dyn EmployeeRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: EmployeeError,
    ) -> EmployeeError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    /// Snapshot for diffing; `password_hash` is skipped by serde, so it can
    /// never leak into the audit trail.
    fn snapshot(employee: &Employee) -> Value {
        serde_json::to_value(employee).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl EmployeeService for EmployeeServiceImpl {
    async fn list(&self) -> Result<Vec<Employee>, EmployeeError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Employee, EmployeeError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(EmployeeError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateEmployeeRequest,
    ) -> Result<Employee, EmployeeError> {
        const ACTION: &str = "employee.create";

        if self
            .repository
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(self.fail(ctx, ACTION, None, EmployeeError::DuplicateEmail).await);
        }

        let password_hash = hash(&request.password, DEFAULT_COST).map_err(|e| {
            EmployeeError::DatabaseError(format!("Password hashing failed: {}", e))
        })?;

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            password_hash,
            permissions: request.permissions,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&employee).await {
            Ok(created) => created,
            Err(error) => return Err(self.fail(ctx, ACTION, None, error.into()).await),
        };

        let changes = audit_service::creation_changes(&Self::snapshot(&created));
        self.audit
            .success(
                ctx,
                ACTION,
                TARGET_MODEL,
                Some(created.id),
                changes,
                json!({ "name": created.name }),
            )
            .await;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateEmployeeRequest,
    ) -> Result<Employee, EmployeeError> {
        const ACTION: &str = "employee.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), EmployeeError::NotFound).await),
        };

        if let Some(email) = &request.email {
            let collision = self.repository.find_by_email(email).await?;
            if collision.is_some_and(|other| other.id != id) {
                return Err(
                    self.fail(ctx, ACTION, Some(id), EmployeeError::DuplicateEmail)
                        .await,
                );
            }
        }

        let mut updated = existing.clone();
        if let Some(name) = request.name.clone() {
            updated.name = name;
        }
        if let Some(email) = request.email.clone() {
            updated.email = email;
        }
        if let Some(permissions) = request.permissions.clone() {
            updated.permissions = permissions;
        }
        if let Some(is_active) = request.is_active {
            updated.is_active = is_active;
        }
        updated.updated_at = Utc::now();

        let stored = match self.repository.update(&updated).await {
            Ok(stored) => stored,
            Err(error) => return Err(self.fail(ctx, ACTION, Some(id), error.into()).await),
        };

        let fields = request.changed_fields();
        let changes = audit_service::diff(
            &Self::snapshot(&existing),
            &Self::snapshot(&stored),
            fields.iter().copied(),
        );
        self.audit
            .success(
                ctx,
                ACTION,
                TARGET_MODEL,
                Some(stored.id),
                changes,
                json!({ "fields": fields }),
            )
            .await;
        Ok(stored)
    }

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), EmployeeError> {
        const ACTION: &str = "employee.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), EmployeeError::NotFound).await),
        };

        if let Err(error) = self.repository.delete(id).await {
            return Err(self.fail(ctx, ACTION, Some(id), error.into()).await);
        }

        let changes = audit_service::deletion_changes(&Self::snapshot(&existing));
        self.audit
            .success(
                ctx,
                ACTION,
                TARGET_MODEL,
                Some(id),
                changes,
                json!({ "name": existing.name }),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::audit_service::testing::MockAuditRepository;
    use crate::services::auth_service::testing::MockEmployeeRepository;

    fn service() -> (EmployeeServiceImpl, Arc<MockAuditRepository>) {
        let audit_log = Arc::new(MockAuditRepository::new());
        let service = EmployeeServiceImpl::new(
            Arc::new(MockEmployeeRepository::new()),
            Arc::new(AuditRecorder::new(audit_log.clone())),
        );
        (service, audit_log)
    }

    fn ctx() -> AuditContext {
        AuditContext {
            actor_id: Uuid::new_v4(),
            actor_name: "Test Admin".to_string(),
            ip_address: None,
            user_agent: None,
        }
    }

    fn create_request(email: &str) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            name: "New Hire".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            permissions: vec!["categories.*".to_string()],
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let (service, _) = service();
        let created = service
            .create(&ctx(), create_request("staff@example.com"))
            .await
            .unwrap();
        assert_ne!(created.password_hash, "password123");
        assert!(bcrypt::verify("password123", &created.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_email_is_rejected() {
        let (service, _) = service();
        service
            .create(&ctx(), create_request("staff@example.com"))
            .await
            .unwrap();
        let result = service.create(&ctx(), create_request("staff@example.com")).await;
        assert!(matches!(result.unwrap_err(), EmployeeError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_audit_snapshot_never_contains_password_hash() {
        let (service, audit_log) = service();
        service
            .create(&ctx(), create_request("staff@example.com"))
            .await
            .unwrap();

        let entry = audit_log.recorded().into_iter().last().unwrap();
        let changes = entry.changes.as_object().unwrap();
        assert!(!changes.contains_key("password_hash"));
        assert!(changes.contains_key("email"));
    }

    #[tokio::test]
    async fn test_update_permissions_is_audited() {
        let (service, audit_log) = service();
        let created = service
            .create(&ctx(), create_request("staff@example.com"))
            .await
            .unwrap();

        let request = UpdateEmployeeRequest {
            permissions: Some(vec!["*".to_string()]),
            ..Default::default()
        };
        service.update(&ctx(), created.id, request).await.unwrap();

        let entry = audit_log.recorded().into_iter().last().unwrap();
        assert_eq!(entry.action, "employee.update");
        assert_eq!(
            entry.changes["permissions"],
            json!({ "oldValue": ["categories.*"], "newValue": ["*"] })
        );
    }
}
