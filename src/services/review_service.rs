use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::review::{Review, UpdateReviewRequest};
use crate::repositories::review_repository::ReviewRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};

const TARGET_MODEL: &str = "Review";

/// Review service errors
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Review not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ReviewError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ReviewError::NotFound,
            RepositoryError::ConstraintViolation(msg) => ReviewError::Validation(msg),
            RepositoryError::DatabaseError(msg) => ReviewError::DatabaseError(msg),
        }
    }
}

/// Reviews are written storefront-side; the back office moderates them.
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn list(&self) -> Result<Vec<Review>, ReviewError>;
    async fn get(&self, id: Uuid) -> Result<Review, ReviewError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<Review, ReviewError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), ReviewError>;
}

/// Implementation of ReviewService
pub struct ReviewServiceImpl {
    repository: Arc<dyn ReviewRepository>,
    audit: Arc<AuditRecorder>,
}

impl ReviewServiceImpl {
    pub fn new(repository: Arc<dyn ReviewRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: ReviewError,
    ) -> ReviewError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(review: &Review) -> Value {
        serde_json::to_value(review).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl ReviewService for ReviewServiceImpl {
    async fn list(&self) -> Result<Vec<Review>, ReviewError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Review, ReviewError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ReviewError::NotFound)
    }

    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<Review, ReviewError> {
        const ACTION: &str = "review.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), ReviewError::NotFound).await),
        };

        if let Some(rating) = request.rating {
            if !(1..=5).contains(&rating) {
                let error =
                    ReviewError::Validation("Rating must be between 1 and 5".to_string());
                return Err(self.fail(ctx, ACTION, Some(id), error).await);
            }
        }

        let mut updated = existing.clone();
        if let Some(rating) = request.rating {
            updated.rating = rating;
        }
        if let Some(comment) = request.comment.clone() {
            updated.comment = Some(comment);
        }
        if let Some(is_approved) = request.is_approved {
            updated.is_approved = is_approved;
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

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), ReviewError> {
        const ACTION: &str = "review.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), ReviewError::NotFound).await),
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
                json!({ "product_id": existing.product_id }),
            )
            .await;
        Ok(())
    }
}
