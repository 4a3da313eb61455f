use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::shipping::ShippingZone;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait ShippingRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShippingZone>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<ShippingZone>, RepositoryError>;
    async fn insert(&self, zone: &ShippingZone) -> Result<ShippingZone, RepositoryError>;
    async fn update(&self, zone: &ShippingZone) -> Result<ShippingZone, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of ShippingRepository.
pub struct PostgresShippingRepository {
    pool: PgPool,
}

impl PostgresShippingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, region, cost, is_active, created_at, updated_at";

#[async_trait]
impl ShippingRepository for PostgresShippingRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShippingZone>, RepositoryError> {
        let zone = sqlx::query_as::<_, ShippingZone>(&format!(
            "SELECT {SELECT_COLUMNS} FROM shipping_zones WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(zone)
    }

    async fn find_all(&self) -> Result<Vec<ShippingZone>, RepositoryError> {
        let zones = sqlx::query_as::<_, ShippingZone>(&format!(
            "SELECT {SELECT_COLUMNS} FROM shipping_zones ORDER BY region ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(zones)
    }

    async fn insert(&self, zone: &ShippingZone) -> Result<ShippingZone, RepositoryError> {
        let inserted = sqlx::query_as::<_, ShippingZone>(&format!(
            "INSERT INTO shipping_zones (id, region, cost, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(zone.id)
        .bind(&zone.region)
        .bind(zone.cost)
        .bind(zone.is_active)
        .bind(zone.created_at)
        .bind(zone.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update(&self, zone: &ShippingZone) -> Result<ShippingZone, RepositoryError> {
        let updated = sqlx::query_as::<_, ShippingZone>(&format!(
            "UPDATE shipping_zones SET region = $2, cost = $3, is_active = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(zone.id)
        .bind(&zone.region)
        .bind(zone.cost)
        .bind(zone.is_active)
        .bind(zone.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shipping_zones WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
