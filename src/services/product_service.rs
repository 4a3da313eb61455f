use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::AuditContext;
use crate::models::product::{CreateProductRequest, Product, UpdateProductRequest};
use crate::repositories::product_repository::ProductRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};
use crate::validation::slugify;

const TARGET_MODEL: &str = "Product";

/// Product service errors
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ProductError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ProductError::NotFound,
            RepositoryError::ConstraintViolation(msg) => ProductError::Validation(msg),
            RepositoryError::DatabaseError(msg) => ProductError::DatabaseError(msg),
        }
    }
}

#[async_trait]
pub trait ProductService: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, ProductError>;
    async fn get(&self, id: Uuid) -> Result<Product, ProductError>;
    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateProductRequest,
    ) -> Result<Product, ProductError>;
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<Product, ProductError>;
    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), ProductError>;
}

/// Implementation of ProductService
pub struct ProductServiceImpl {
    repository: Arc<dyn ProductRepository>,
    audit: Arc<AuditRecorder>,
}

impl ProductServiceImpl {
    pub fn new(repository: Arc<dyn ProductRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: ProductError,
    ) -> ProductError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(product: &Product) -> Value {
        serde_json::to_value(product).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    async fn list(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Product, ProductError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ProductError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateProductRequest,
    ) -> Result<Product, ProductError> {
        const ACTION: &str = "product.create";

        if request.price <= Decimal::ZERO {
            let error = ProductError::Validation("Price must be greater than 0".to_string());
            return Err(self.fail(ctx, ACTION, None, error).await);
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            slug: slugify(&request.name),
            name: request.name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            sku: request.sku,
            category_id: request.category_id,
            brand_id: request.brand_id,
            images: request.images.unwrap_or_default(),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&product).await {
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
        request: UpdateProductRequest,
    ) -> Result<Product, ProductError> {
        const ACTION: &str = "product.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), ProductError::NotFound).await),
        };

        if let Some(price) = request.price {
            if price <= Decimal::ZERO {
                let error = ProductError::Validation("Price must be greater than 0".to_string());
                return Err(self.fail(ctx, ACTION, Some(id), error).await);
            }
        }

        let mut updated = existing.clone();
        if let Some(name) = request.name.clone() {
            updated.name = name;
        }
        if let Some(description) = request.description.clone() {
            updated.description = Some(description);
        }
        if let Some(price) = request.price {
            updated.price = price;
        }
        if let Some(stock) = request.stock {
            updated.stock = stock;
        }
        if let Some(sku) = request.sku.clone() {
            updated.sku = Some(sku);
        }
        if let Some(category_id) = request.category_id {
            updated.category_id = Some(category_id);
        }
        if let Some(brand_id) = request.brand_id {
            updated.brand_id = Some(brand_id);
        }
        if let Some(images) = request.images.clone() {
            updated.images = images;
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

    async fn delete(&self, ctx: &AuditContext, id: Uuid) -> Result<(), ProductError> {
        const ACTION: &str = "product.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), ProductError::NotFound).await),
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
