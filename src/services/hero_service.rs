use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::hero::{CreateHeroRequest, HeroSlide, UpdateHeroRequest};
use crate::repositories::hero_repository::HeroRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "HeroSlide";

/// Hero slide service errors
#[derive(Debug, thiserror::Error)]
pub enum HeroError {
    #[error("Hero slide not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for HeroError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => HeroError::NotFound,
            RepositoryError::ConstraintViolation(msg) => HeroError::Validation(msg),
            RepositoryError::DatabaseError(msg) => HeroError::DatabaseError(msg),
        }
    }
}

#[async_trait]
pub trait HeroService: Send + Sync {
    async fn list(&self) -> Result<Vec<HeroSlide>, HeroError>;
    async fn get(&self, id: Uuid) -> Result<HeroSlide, HeroError>;
    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateHeroRequest,
    ) -> Result<HeroSlide, HeroError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateHeroRequest,
    ) -> Result<HeroSlide, HeroError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), HeroError>;
}

/// Implementation of HeroService
pub struct HeroServiceImpl {
    repository: Arc<dyn HeroRepository>,
    audit: Arc<AuditRecorder>,
}

impl HeroServiceImpl {
    pub fn new(repository: Arc<dyn HeroRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: HeroError,
    ) -> HeroError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(slide: &HeroSlide) -> Value {
        serde_json::to_value(slide).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl HeroService for HeroServiceImpl {
    async fn list(&self) -> Result<Vec<HeroSlide>, HeroError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<HeroSlide, HeroError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(HeroError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateHeroRequest,
    ) -> Result<HeroSlide, HeroError> {
        const ACTION: &str = "hero.create";

        let now = Utc::now();
        let slide = HeroSlide {
            id: Uuid::new_v4(),
            title: request.title,
            image: request.image,
            link: request.link,
            sort_order: request.sort_order.unwrap_or(0),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&slide).await {
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
                json!({ "title": created.title }),
            )
            .await;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateHeroRequest,
    ) -> Result<HeroSlide, HeroError> {
        const ACTION: &str = "hero.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), HeroError::NotFound).await),
        };

        let mut updated = existing.clone();
        if let Some(title) = request.title.clone() {
            updated.title = title;
        }
        if let Some(image) = request.image.clone() {
            updated.image = image;
        }
        if let Some(link) = request.link.clone() {
            updated.link = Some(link);
        }
        if let Some(sort_order) = request.sort_order {
            updated.sort_order = sort_order;
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

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), HeroError> {
        const ACTION: &str = "hero.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), HeroError::NotFound).await),
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
                json!({ "title": existing.title }),
            )
            .await;
        Ok(())
    }
}
