use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::product::Product;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn insert(&self, product: &Product) -> Result<Product, RepositoryError>;
    async fn update(&self, product: &Product) -> Result<Product, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of ProductRepository.
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, name, slug, description, price, stock, sku, category_id, \
                              brand_id, images, is_active, created_at, updated_at";

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn insert(&self, product: &Product) -> Result<Product, RepositoryError> {
        let inserted = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products \
                 (id, name, slug, description, price, stock, sku, category_id, brand_id, images, \
                  is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(product.category_id)
        .bind(product.brand_id)
        .bind(&product.images)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let updated = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products \
             SET name = $2, slug = $3, description = $4, price = $5, stock = $6, sku = $7, \
                 category_id = $8, brand_id = $9, images = $10, is_active = $11, updated_at = $12 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(product.category_id)
        .bind(product.brand_id)
        .bind(&product.images)
        .bind(product.is_active)
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
