use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A node in the category forest.
///
/// `parent_id` is the source of truth for the hierarchy edge; `children` is a
/// denormalized mirror of the reverse direction and is only ever written in
/// the same transaction as the parent pointer it mirrors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Derived from `name` at creation time; never recomputed on rename.
    pub slug: String,
    /// `None` marks a root ("main") category.
    pub parent_id: Option<Uuid>,
    pub children: Vec<Uuid>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    #[cfg(test)]
    pub fn test_fixture(id: Uuid, name: &str, parent_id: Option<Uuid>) -> Self {
        Self {
            id,
            name: name.to_string(),
            slug: crate::validation::slugify(name),
            parent_id,
            children: Vec::new(),
            image: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Flat listing row for the table view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryTableRow {
    #[serde(flatten)]
    pub category: Category,
    pub child_count: i64,
    pub product_count: i64,
}

/// Outcome of a cascading delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDeletion {
    pub deleted_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial update. `parent_id` distinguishes three states: absent (keep the
/// current parent), `null` (detach, becoming a root category) and a value
/// (re-parent under that category).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateCategoryRequest {
    /// Field names present in this payload, used to scope the audit diff.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.parent_id.is_some() {
            fields.push("parent_id");
        }
        if self.image.is_some() {
            fields.push("image");
        }
        if self.is_active.is_some() {
            fields.push("is_active");
        }
        fields
    }
}
