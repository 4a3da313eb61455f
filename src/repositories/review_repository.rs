use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::review::Review;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Review>, RepositoryError>;
    async fn update(&self, review: &Review) -> Result<Review, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of ReviewRepository.
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, product_id, customer_id, rating, comment, is_approved, created_at, updated_at";

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {SELECT_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn find_all(&self) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {SELECT_COLUMNS} FROM reviews ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn update(&self, review: &Review) -> Result<Review, RepositoryError> {
        let updated = sqlx::query_as::<_, Review>(&format!(
            "UPDATE reviews \
             SET rating = $2, comment = $3, is_approved = $4, updated_at = $5 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(review.id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.is_approved)
        .bind(review.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
