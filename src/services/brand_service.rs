use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::brand::{Brand, CreateBrandRequest, UpdateBrandRequest};
use crate::repositories::brand_repository::BrandRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "Brand";

/// Brand service errors
#[derive(Debug, thiserror::Error)]
pub enum BrandError {
    #[error("Brand not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for BrandError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => BrandError::NotFound,
            RepositoryError::ConstraintViolation(msg) => BrandError::Validation(msg),
            RepositoryError::DatabaseError(msg) => BrandError::DatabaseError(msg),
        }
    }
}

#[async_trait]
pub trait BrandService: Send + Sync {
    async fn list(&self) -> Result<Vec<Brand>, BrandError>;
    async fn get(&self, id: Uuid) -> Result<Brand, BrandError>;
    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateBrandRequest,
    ) -> Result<Brand, BrandError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateBrandRequest,
    ) -> Result<Brand, BrandError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), BrandError>;
}

/// Implementation of BrandService
pub struct BrandServiceImpl {
    repository: Arc<dyn BrandRepository>,
    audit: Arc<AuditRecorder>,
}

impl BrandServiceImpl {
    pub fn new(repository: Arc<dyn BrandRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: BrandError,
    ) -> BrandError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(brand: &Brand) -> Value {
        serde_json::to_value(brand).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl BrandService for BrandServiceImpl {
    async fn list(&self) -> Result<Vec<Brand>, BrandError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Brand, BrandError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(BrandError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateBrandRequest,
    ) -> Result<Brand, BrandError> {
        const ACTION: &str = "brand.create";

        let now = Utc::now();
        let brand = Brand {
            id: Uuid::new_v4(),
            name: request.name,
            image: request.image,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&brand).await {
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
        request: UpdateBrandRequest,
    ) -> Result<Brand, BrandError> {
        const ACTION: &str = "brand.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), BrandError::NotFound).await),
        };

        let mut updated = existing.clone();
        if let Some(name) = request.name.clone() {
            updated.name = name;
        }
        if let Some(image) = request.image.clone() {
            updated.image = Some(image);
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

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), BrandError> {
        const ACTION: &str = "brand.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), BrandError::NotFound).await),
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
