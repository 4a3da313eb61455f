use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_positive_price;

/// Catalog product. SKU values are generated by an external service and stored
/// verbatim; `category_id` is nulled by the store when its category is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = validate_positive_price))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i32,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = validate_positive_price))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.price.is_some() {
            fields.push("price");
        }
        if self.stock.is_some() {
            fields.push("stock");
        }
        if self.sku.is_some() {
            fields.push("sku");
        }
        if self.category_id.is_some() {
            fields.push("category_id");
        }
        if self.brand_id.is_some() {
            fields.push("brand_id");
        }
        if self.images.is_some() {
            fields.push("images");
        }
        if self.is_active.is_some() {
            fields.push("is_active");
        }
        fields
    }
}
