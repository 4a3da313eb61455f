use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_non_negative_amount;

/// Order lifecycle vocabulary. Any transition is accepted at this layer; the
/// allowed-transition table lives outside the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Denormalized line item, stored as JSONB inside the order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItem>,
    #[validate(length(min = 1, message = "Shipping address must not be empty"))]
    pub shipping_address: String,
    #[validate(custom(function = validate_non_negative_amount))]
    pub shipping_cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    #[validate(length(min = 1, message = "Shipping address must not be empty"))]
    pub shipping_address: Option<String>,
    #[validate(custom(function = validate_non_negative_amount))]
    pub shipping_cost: Option<Decimal>,
}

impl UpdateOrderRequest {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.status.is_some() {
            fields.push("status");
        }
        if self.shipping_address.is_some() {
            fields.push("shipping_address");
        }
        if self.shipping_cost.is_some() {
            fields.push("shipping_cost");
        }
        fields
    }
}
