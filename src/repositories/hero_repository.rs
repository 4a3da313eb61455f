use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::hero::HeroSlide;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait HeroRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<HeroSlide>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<HeroSlide>, RepositoryError>;
    async fn insert(&self, slide: &HeroSlide) -> Result<HeroSlide, RepositoryError>;
    async fn update(&self, slide: &HeroSlide) -> Result<HeroSlide, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of HeroRepository.
pub struct PostgresHeroRepository {
    pool: PgPool,
}

impl PostgresHeroRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, title, image, link, sort_order, is_active, created_at, updated_at";

#[async_trait]
impl HeroRepository for PostgresHeroRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<HeroSlide>, RepositoryError> {
        let slide = sqlx::query_as::<_, HeroSlide>(&format!(
            "SELECT {SELECT_COLUMNS} FROM hero_slides WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(slide)
    }

    async fn find_all(&self) -> Result<Vec<HeroSlide>, RepositoryError> {
        let slides = sqlx::query_as::<_, HeroSlide>(&format!(
            "SELECT {SELECT_COLUMNS} FROM hero_slides ORDER BY sort_order ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(slides)
    }

    async fn insert(&self, slide: &HeroSlide) -> Result<HeroSlide, RepositoryError> {
        let inserted = sqlx::query_as::<_, HeroSlide>(&format!(
            "INSERT INTO hero_slides \
                 (id, title, image, link, sort_order, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(slide.id)
        .bind(&slide.title)
        .bind(&slide.image)
        .bind(&slide.link)
        .bind(slide.sort_order)
        .bind(slide.is_active)
        .bind(slide.created_at)
        .bind(slide.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update(&self, slide: &HeroSlide) -> Result<HeroSlide, RepositoryError> {
        let updated = sqlx::query_as::<_, HeroSlide>(&format!(
            "UPDATE hero_slides \
             SET title = $2, image = $3, link = $4, sort_order = $5, is_active = $6, updated_at = $7 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(slide.id)
        .bind(&slide.title)
        .bind(&slide.image)
        .bind(&slide.link)
        .bind(slide.sort_order)
        .bind(slide.is_active)
        .bind(slide.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM hero_slides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
