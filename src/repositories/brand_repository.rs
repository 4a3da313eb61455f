use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::brand::Brand;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait BrandRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Brand>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Brand>, RepositoryError>;
    async fn insert(&self, brand: &Brand) -> Result<Brand, RepositoryError>;
    async fn update(&self, brand: &Brand) -> Result<Brand, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of BrandRepository.
pub struct PostgresBrandRepository {
    pool: PgPool,
}

impl PostgresBrandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, name, image, is_active, created_at, updated_at";

#[async_trait]
impl BrandRepository for PostgresBrandRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Brand>, RepositoryError> {
        let brand = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {SELECT_COLUMNS} FROM brands WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(brand)
    }

    async fn find_all(&self) -> Result<Vec<Brand>, RepositoryError> {
        let brands = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {SELECT_COLUMNS} FROM brands ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(brands)
    }

    async fn insert(&self, brand: &Brand) -> Result<Brand, RepositoryError> {
        let inserted = sqlx::query_as::<_, Brand>(&format!(
            "INSERT INTO brands (id, name, image, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(brand.id)
        .bind(&brand.name)
        .bind(&brand.image)
        .bind(brand.is_active)
        .bind(brand.created_at)
        .bind(brand.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update(&self, brand: &Brand) -> Result<Brand, RepositoryError> {
        let updated = sqlx::query_as::<_, Brand>(&format!(
            "UPDATE brands SET name = $2, image = $3, is_active = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(brand.id)
        .bind(&brand.name)
        .bind(&brand.image)
        .bind(brand.is_active)
        .bind(brand.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
