use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::customer::{Customer, UpdateCustomerRequest};
use crate::repositories::customer_repository::CustomerRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "Customer";

/// Customer service errors
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Customer not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CustomerError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => CustomerError::NotFound,
            RepositoryError::ConstraintViolation(msg) => CustomerError::Validation(msg),
            RepositoryError::DatabaseError(msg) => CustomerError::DatabaseError(msg),
        }
    }
}

/// Customer accounts are created storefront-side; the back office edits
/// contact data and the blocked flag, or removes the account.
#[async_trait]
pub trait CustomerService: Send + Sync {
    async fn list(&self) -> Result<Vec<Customer>, CustomerError>;
    async fn get(&self, id: Uuid) -> Result<Customer, CustomerError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<Customer, CustomerError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), CustomerError>;
}

/// Implementation of CustomerService
pub struct CustomerServiceImpl {
    repository: Arc<dyn CustomerRepository>,
    audit: Arc<AuditRecorder>,
}

impl CustomerServiceImpl {
    pub fn new(repository: Arc<dyn CustomerRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: CustomerError,
    ) -> CustomerError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(customer: &Customer) -> Value {
        serde_json::to_value(customer).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl CustomerService for CustomerServiceImpl {
    async fn list(&self) -> Result<Vec<Customer>, CustomerError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Customer, CustomerError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound)
    }

    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<Customer, CustomerError> {
        const ACTION: &str = "customer.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), CustomerError::NotFound).await),
        };

        let mut updated = existing.clone();
        if let Some(name) = request.name.clone() {
            updated.name = name;
        }
        if let Some(email) = request.email.clone() {
            updated.email = email;
        }
        if let Some(phone) = request.phone.clone() {
            updated.phone = Some(phone);
        }
        if let Some(address) = request.address.clone() {
            updated.address = Some(address);
        }
        if let Some(is_blocked) = request.is_blocked {
            updated.is_blocked = is_blocked;
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

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), CustomerError> {
        const ACTION: &str = "customer.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), CustomerError::NotFound).await),
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
