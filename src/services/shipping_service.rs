use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::shipping::{CreateShippingRequest, ShippingZone, UpdateShippingRequest};
use crate::repositories::shipping_repository::ShippingRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "ShippingZone";

/// Shipping service errors
#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    #[error("Shipping zone not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ShippingError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ShippingError::NotFound,
            RepositoryError::ConstraintViolation(msg) => ShippingError::Validation(msg),
            RepositoryError::DatabaseError(msg) => ShippingError::DatabaseError(msg),
        }
    }
}

#[async_trait]
pub trait ShippingService: Send + Sync {
    async fn list(&self) -> Result<Vec<ShippingZone>, ShippingError>;
    async fn get(&self, id: Uuid) -> Result<ShippingZone, ShippingError>;
    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateShippingRequest,
    ) -> Result<ShippingZone, ShippingError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateShippingRequest,
    ) -> Result<ShippingZone, ShippingError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), ShippingError>;
}

/// Implementation of ShippingService
pub struct ShippingServiceImpl {
    repository: Arc<dyn ShippingRepository>,
    audit: Arc<AuditRecorder>,
}

impl ShippingServiceImpl {
    pub fn new(repository: Arc<dyn ShippingRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: ShippingError,
    ) -> ShippingError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(zone: &ShippingZone) -> Value {
        serde_json::to_value(zone).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl ShippingService for ShippingServiceImpl {
    async fn list(&self) -> Result<Vec<ShippingZone>, ShippingError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<ShippingZone, ShippingError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ShippingError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateShippingRequest,
    ) -> Result<ShippingZone, ShippingError> {
        const ACTION: &str = "shipping.create";

        if request.cost < Decimal::ZERO {
            let error = ShippingError::Validation("Cost must not be negative".to_string());
            return Err(self.fail(ctx, ACTION, None, error).await);
        }

        let now = Utc::now();
        let zone = ShippingZone {
            id: Uuid::new_v4(),
            region: request.region,
            cost: request.cost,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&zone).await {
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
                json!({ "region": created.region }),
            )
            .await;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateShippingRequest,
    ) -> Result<ShippingZone, ShippingError> {
        const ACTION: &str = "shipping.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), ShippingError::NotFound).await),
        };

        if let Some(cost) = request.cost {
            if cost < Decimal::ZERO {
                let error = ShippingError::Validation("Cost must not be negative".to_string());
                return Err(self.fail(ctx, ACTION, Some(id), error).await);
            }
        }

        let mut updated = existing.clone();
        if let Some(region) = request.region.clone() {
            updated.region = region;
        }
        if let Some(cost) = request.cost {
            updated.cost = cost;
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

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), ShippingError> {
        const ACTION: &str = "shipping.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), ShippingError::NotFound).await),
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
                json!({ "region": existing.region }),
            )
            .await;
        Ok(())
    }
}
