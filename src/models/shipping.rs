use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_non_negative_amount;

/// Flat-cost shipping rule for a region. Rule evaluation happens storefront
/// side; the back office only maintains the table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ShippingZone {
    pub id: Uuid,
    pub region: String,
    pub cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateShippingRequest {
    #[validate(length(min = 1, message = "Region must not be empty"))]
    pub region: String,
    #[validate(custom(function = validate_non_negative_amount))]
    pub cost: Decimal,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateShippingRequest {
    #[validate(length(min = 1, message = "Region must not be empty"))]
    pub region: Option<String>,
    #[validate(custom(function = validate_non_negative_amount))]
    pub cost: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl UpdateShippingRequest {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.region.is_some() {
            fields.push("region");
        }
        if self.cost.is_some() {
            fields.push("cost");
        }
        if self.is_active.is_some() {
            fields.push("is_active");
        }
        fields
    }
}
