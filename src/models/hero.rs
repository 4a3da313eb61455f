use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Promotional slide shown on the storefront landing page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct HeroSlide {
    pub id: Uuid,
    pub title: String,
    pub image: String,
    pub link: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateHeroRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Image URL must not be empty"))]
    pub image: String,
    pub link: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateHeroRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Image URL must not be empty"))]
    pub image: Option<String>,
    pub link: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateHeroRequest {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.image.is_some() {
            fields.push("image");
        }
        if self.link.is_some() {
            fields.push("link");
        }
        if self.sort_order.is_some() {
            fields.push("sort_order");
        }
        if self.is_active.is_some() {
            fields.push("is_active");
        }
        fields
    }
}
