use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::hierarchy;
use crate::models::audit::AuditContext;
use crate::models::category::{
    Category, CategoryDeletion, CategoryTableRow, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::RepositoryError;
use crate::services::audit_service::{self, AuditRecorder};
use crate::validation::slugify;

const TARGET_MODEL: &str = "Category";

/// Category service errors.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    NotFound,

    #[error("A category with this name already exists")]
    DuplicateName,

    #[error("Cannot make a descendant the parent of one of its ancestors")]
    CircularReference,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => CategoryError::NotFound,
            // The only unique constraint on categories is the case-insensitive
            // name index.
            RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateName,
            RepositoryError::DatabaseError(msg) => CategoryError::DatabaseError(msg),
        }
    }
}

/// Operations on the category forest. Every mutation protects the no-cycle
/// and mirror-consistency invariants and records an audit entry, success or
/// failure.
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Flat listing annotated with child and product counts.
    async fn list_table(&self) -> Result<Vec<CategoryTableRow>, CategoryError>;

    /// Full flat set; clients rebuild the nesting from `parent_id`.
    async fn list_tree(&self) -> Result<Vec<Category>, CategoryError>;

    async fn get(&self, id: Uuid) -> Result<Category, CategoryError>;

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Partial update, including re-parenting.
    async fn update(
        &self,
        ctx: &AuditContext,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Cascading delete of the category and its whole subtree.
    async fn delete(
        &self,
        ctx: &AuditContext,
        id: Uuid,
    ) -> Result<CategoryDeletion, CategoryError>;
}

/// Implementation of CategoryService.
pub struct CategoryServiceImpl {
    repository: Arc<dyn CategoryRepository>,
    audit: Arc<AuditRecorder>,
}

impl CategoryServiceImpl {
    pub fn new(repository: Arc<dyn CategoryRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { repository, audit }
    }

    /// Records the failure and hands the error back for propagation.
    async fn fail(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_id: Option<Uuid>,
        error: CategoryError,
    ) -> CategoryError {
        self.audit
            .failure(ctx, action, TARGET_MODEL, target_id, &error.to_string())
            .await;
        error
    }

    fn snapshot(category: &Category) -> Value {
        serde_json::to_value(category).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn list_table(&self) -> Result<Vec<CategoryTableRow>, CategoryError> {
        let categories = self.repository.find_all().await?;
        let product_counts: HashMap<Uuid, i64> =
            self.repository.product_counts().await?.into_iter().collect();
        // Child counts come from the parent pointers, not the stored mirror.
        let children = hierarchy::child_index(&categories);

        Ok(categories
            .into_iter()
            .map(|category| {
                let child_count = children.get(&category.id).map_or(0, |c| c.len() as i64);
                let product_count = product_counts.get(&category.id).copied().unwrap_or(0);
                CategoryTableRow {
                    category,
                    child_count,
                    product_count,
                }
            })
            .collect())
    }

    async fn list_tree(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.repository.find_all().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Category, CategoryError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    async fn create(
        &self,
        ctx: &AuditContext,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        const ACTION: &str = "category.create";

        let name = request.name.trim().to_string();
        if name.is_empty() {
            let error = CategoryError::Validation("Name must not be empty".to_string());
            return Err(self.fail(ctx, ACTION, None, error).await);
        }

        if self.repository.find_by_name_ci(&name).await?.is_some() {
            return Err(self.fail(ctx, ACTION, None, CategoryError::DuplicateName).await);
        }

        if let Some(parent_id) = request.parent_id {
            if self.repository.find_by_id(parent_id).await?.is_none() {
                let error =
                    CategoryError::Validation("Parent category does not exist".to_string());
                return Err(self.fail(ctx, ACTION, None, error).await);
            }
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            parent_id: request.parent_id,
            children: Vec::new(),
            image: request.image,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = match self.repository.insert(&category).await {
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
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        const ACTION: &str = "category.update";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), CategoryError::NotFound).await),
        };

        if let Some(name) = &request.name {
            let collision = self.repository.find_by_name_ci(name).await?;
            if collision.is_some_and(|other| other.id != id) {
                return Err(
                    self.fail(ctx, ACTION, Some(id), CategoryError::DuplicateName)
                        .await,
                );
            }
        }

        // Absent: keep the current parent. Null: detach. Value: re-parent.
        let target_parent = match request.parent_id {
            None => existing.parent_id,
            Some(parent) => parent,
        };
        let reparenting = target_parent != existing.parent_id;

        if reparenting {
            if let Some(parent_id) = target_parent {
                if parent_id == id {
                    return Err(
                        self.fail(ctx, ACTION, Some(id), CategoryError::CircularReference)
                            .await,
                    );
                }
                let all = self.repository.find_all().await?;
                if !all.iter().any(|c| c.id == parent_id) {
                    let error =
                        CategoryError::Validation("Parent category does not exist".to_string());
                    return Err(self.fail(ctx, ACTION, Some(id), error).await);
                }
                let parents = hierarchy::parent_index(&all);
                if hierarchy::would_create_cycle(id, parent_id, &parents) {
                    return Err(
                        self.fail(ctx, ACTION, Some(id), CategoryError::CircularReference)
                            .await,
                    );
                }
            }
        }

        let mut updated = existing.clone();
        if let Some(name) = request.name.clone() {
            // The slug keeps its creation-time value through renames.
            updated.name = name;
        }
        if let Some(image) = request.image.clone() {
            updated.image = Some(image);
        }
        if let Some(is_active) = request.is_active {
            updated.is_active = is_active;
        }
        updated.parent_id = target_parent;
        updated.updated_at = Utc::now();

        let write = if reparenting {
            self.repository
                .update_with_reparent(&updated, existing.parent_id, target_parent)
                .await
        } else {
            self.repository.update(&updated).await
        };
        let stored = match write {
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

    async fn delete(
        &self,
        ctx: &AuditContext,
        id: Uuid,
    ) -> Result<CategoryDeletion, CategoryError> {
        const ACTION: &str = "category.delete";

        let existing = match self.repository.find_by_id(id).await? {
            Some(existing) => existing,
            None => return Err(self.fail(ctx, ACTION, Some(id), CategoryError::NotFound).await),
        };

        // The deletion set comes from the parent pointers, so descendants are
        // found even if the stored children mirror were stale.
        let all = self.repository.find_all().await?;
        let children = hierarchy::child_index(&all);
        let deleted_ids = hierarchy::collect_subtree_ids(id, &children);

        let detach = existing.parent_id.map(|parent_id| (parent_id, id));
        if let Err(error) = self.repository.delete_subtree(&deleted_ids, detach).await {
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
                json!({
                    "name": existing.name,
                    "deleted_count": deleted_ids.len(),
                    "deleted_ids": deleted_ids,
                }),
            )
            .await;
        Ok(CategoryDeletion { deleted_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::AuditStatus;
    use crate::services::audit_service::testing::MockAuditRepository;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // In-memory CategoryRepository mirroring the transactional semantics of
    // the Postgres implementation: hierarchy edges and the children arrays
    // change together or not at all.
    struct MockCategoryRepository {
        categories: Mutex<HashMap<Uuid, Category>>,
        product_counts: Mutex<HashMap<Uuid, i64>>,
        should_fail: bool,
    }

    impl MockCategoryRepository {
        fn new() -> Self {
            Self {
                categories: Mutex::new(HashMap::new()),
                product_counts: Mutex::new(HashMap::new()),
                should_fail: false,
            }
        }

        fn with_failure() -> Self {
            Self {
                categories: Mutex::new(HashMap::new()),
                product_counts: Mutex::new(HashMap::new()),
                should_fail: true,
            }
        }

        fn all(&self) -> Vec<Category> {
            self.categories.lock().unwrap().values().cloned().collect()
        }

        fn guard(&self) -> Result<(), RepositoryError> {
            if self.should_fail {
                return Err(RepositoryError::DatabaseError(
                    "Database connection failed".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CategoryRepository for MockCategoryRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
            self.guard()?;
            Ok(self.categories.lock().unwrap().get(&id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
            self.guard()?;
            Ok(self.all())
        }

        async fn find_by_name_ci(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
            self.guard()?;
            let lowered = name.to_lowercase();
            Ok(self
                .categories
                .lock()
                .unwrap()
                .values()
                .find(|c| c.name.to_lowercase() == lowered)
                .cloned())
        }

        async fn product_counts(&self) -> Result<Vec<(Uuid, i64)>, RepositoryError> {
            self.guard()?;
            Ok(self
                .product_counts
                .lock()
                .unwrap()
                .iter()
                .map(|(id, count)| (*id, *count))
                .collect())
        }

        async fn insert(&self, category: &Category) -> Result<Category, RepositoryError> {
            self.guard()?;
            let mut categories = self.categories.lock().unwrap();
            if let Some(parent_id) = category.parent_id {
                let parent = categories
                    .get_mut(&parent_id)
                    .ok_or(RepositoryError::NotFound)?;
                if !parent.children.contains(&category.id) {
                    parent.children.push(category.id);
                }
            }
            categories.insert(category.id, category.clone());
            Ok(category.clone())
        }

        async fn update(&self, category: &Category) -> Result<Category, RepositoryError> {
            self.guard()?;
            let mut categories = self.categories.lock().unwrap();
            let stored = categories
                .get_mut(&category.id)
                .ok_or(RepositoryError::NotFound)?;
            stored.name = category.name.clone();
            stored.slug = category.slug.clone();
            stored.image = category.image.clone();
            stored.is_active = category.is_active;
            stored.updated_at = category.updated_at;
            Ok(stored.clone())
        }

        async fn update_with_reparent(
            &self,
            category: &Category,
            old_parent: Option<Uuid>,
            new_parent: Option<Uuid>,
        ) -> Result<Category, RepositoryError> {
            self.guard()?;
            let mut categories = self.categories.lock().unwrap();
            if let Some(new_id) = new_parent {
                if !categories.contains_key(&new_id) {
                    return Err(RepositoryError::NotFound);
                }
            }
            {
                let stored = categories
                    .get_mut(&category.id)
                    .ok_or(RepositoryError::NotFound)?;
                stored.name = category.name.clone();
                stored.slug = category.slug.clone();
                stored.parent_id = category.parent_id;
                stored.image = category.image.clone();
                stored.is_active = category.is_active;
                stored.updated_at = category.updated_at;
            }
            if let Some(old_id) = old_parent {
                if let Some(parent) = categories.get_mut(&old_id) {
                    parent.children.retain(|c| *c != category.id);
                }
            }
            if let Some(new_id) = new_parent {
                let parent = categories.get_mut(&new_id).unwrap();
                if !parent.children.contains(&category.id) {
                    parent.children.push(category.id);
                }
            }
            Ok(categories.get(&category.id).cloned().unwrap())
        }

        async fn delete_subtree(
            &self,
            ids: &[Uuid],
            detach: Option<(Uuid, Uuid)>,
        ) -> Result<u64, RepositoryError> {
            self.guard()?;
            let mut categories = self.categories.lock().unwrap();
            if let Some((parent_id, root_id)) = detach {
                if let Some(parent) = categories.get_mut(&parent_id) {
                    parent.children.retain(|c| *c != root_id);
                }
            }
            let mut deleted = 0;
            for id in ids {
                if categories.remove(id).is_some() {
                    deleted += 1;
                }
            }
            Ok(deleted)
        }
    }

    struct Harness {
        service: CategoryServiceImpl,
        repository: Arc<MockCategoryRepository>,
        audit_log: Arc<MockAuditRepository>,
    }

    fn harness() -> Harness {
        let repository = Arc::new(MockCategoryRepository::new());
        let audit_log = Arc::new(MockAuditRepository::new());
        let service = CategoryServiceImpl::new(
            repository.clone(),
            Arc::new(AuditRecorder::new(audit_log.clone())),
        );
        Harness {
            service,
            repository,
            audit_log,
        }
    }

    fn ctx() -> AuditContext {
        AuditContext {
            actor_id: Uuid::new_v4(),
            actor_name: "Test Admin".to_string(),
            ip_address: Some("192.0.2.1".to_string()),
            user_agent: Some("tests".to_string()),
        }
    }

    fn create_request(name: &str, parent_id: Option<Uuid>) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            parent_id,
            image: None,
            is_active: None,
        }
    }

    /// Checks the mirror-consistency invariant over the whole stored forest:
    /// `b.parent_id == Some(a.id)` exactly when `a.children` contains `b.id`.
    fn assert_mirror_consistent(categories: &[Category]) {
        let by_id: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();
        for category in categories {
            if let Some(parent_id) = category.parent_id {
                let parent = by_id
                    .get(&parent_id)
                    .unwrap_or_else(|| panic!("parent {parent_id} of {} missing", category.id));
                assert!(
                    parent.children.contains(&category.id),
                    "children of {} does not mirror parent_id of {}",
                    parent.id,
                    category.id
                );
            }
            for child_id in &category.children {
                let child = by_id
                    .get(child_id)
                    .unwrap_or_else(|| panic!("child {child_id} of {} missing", category.id));
                assert_eq!(child.parent_id, Some(category.id));
            }
        }
    }

    /// Checks the no-cycle invariant by walking parent pointers from every node.
    fn assert_acyclic(categories: &[Category]) {
        let parents = hierarchy::parent_index(categories);
        for category in categories {
            let mut seen = std::collections::HashSet::new();
            let mut current = category.parent_id;
            while let Some(node) = current {
                assert!(
                    node != category.id && seen.insert(node),
                    "cycle reachable from {}",
                    category.id
                );
                current = parents.get(&node).copied().flatten();
            }
        }
    }

    #[tokio::test]
    async fn test_create_root_category() {
        let h = harness();
        let created = h.service.create(&ctx(), create_request("Shoes", None)).await.unwrap();

        assert_eq!(created.name, "Shoes");
        assert_eq!(created.slug, "shoes");
        assert!(created.parent_id.is_none());
        assert!(created.children.is_empty());
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn test_create_child_updates_parent_children() {
        let h = harness();
        let root = h.service.create(&ctx(), create_request("Shoes", None)).await.unwrap();
        let child = h
            .service
            .create(&ctx(), create_request("Running", Some(root.id)))
            .await
            .unwrap();

        let stored_root = h.service.get(root.id).await.unwrap();
        assert!(stored_root.children.contains(&child.id));
        assert_eq!(child.parent_id, Some(root.id));
        assert_mirror_consistent(&h.repository.all());
    }

    #[tokio::test]
    async fn test_create_duplicate_name_is_rejected_case_insensitively() {
        let h = harness();
        h.service.create(&ctx(), create_request("shoes", None)).await.unwrap();

        let result = h.service.create(&ctx(), create_request("Shoes", None)).await;
        assert!(matches!(result.unwrap_err(), CategoryError::DuplicateName));
        // No partial record.
        assert_eq!(h.repository.all().len(), 1);
    }

    #[tokio::test]
    async fn test_create_with_unknown_parent_is_rejected() {
        let h = harness();
        let result = h
            .service
            .create(&ctx(), create_request("Shoes", Some(Uuid::new_v4())))
            .await;
        assert!(matches!(result.unwrap_err(), CategoryError::Validation(_)));
        assert!(h.repository.all().is_empty());
    }

    #[tokio::test]
    async fn test_create_records_creation_audit() {
        let h = harness();
        let created = h.service.create(&ctx(), create_request("Shoes", None)).await.unwrap();

        let entries = h.audit_log.recorded();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.action, "category.create");
        assert_eq!(entry.target_model, "Category");
        assert_eq!(entry.target_id, Some(created.id));
        assert_eq!(entry.status, AuditStatus::Success);
        assert_eq!(
            entry.changes["name"],
            json!({ "oldValue": null, "newValue": "Shoes" })
        );
    }

    #[tokio::test]
    async fn test_failed_create_records_failure_audit() {
        let h = harness();
        h.service.create(&ctx(), create_request("Shoes", None)).await.unwrap();
        let _ = h.service.create(&ctx(), create_request("SHOES", None)).await;

        let entries = h.audit_log.recorded();
        assert_eq!(entries.len(), 2);
        let failure = &entries[1];
        assert_eq!(failure.status, AuditStatus::Failure);
        assert!(failure.error_message.is_some());
        assert!(failure.target_id.is_none());
    }

    #[tokio::test]
    async fn test_reparent_rewrites_both_children_arrays() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h.service.create(&ctx(), create_request("B", None)).await.unwrap();
        let c = h
            .service
            .create(&ctx(), create_request("C", Some(a.id)))
            .await
            .unwrap();

        let request = UpdateCategoryRequest {
            parent_id: Some(Some(b.id)),
            ..Default::default()
        };
        let moved = h.service.update(&ctx(), c.id, request).await.unwrap();

        assert_eq!(moved.parent_id, Some(b.id));
        let stored_a = h.service.get(a.id).await.unwrap();
        let stored_b = h.service.get(b.id).await.unwrap();
        assert!(!stored_a.children.contains(&c.id));
        assert!(stored_b.children.contains(&c.id));
        assert_mirror_consistent(&h.repository.all());
    }

    #[tokio::test]
    async fn test_reparent_to_descendant_is_rejected_and_store_unchanged() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h
            .service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();
        let c = h
            .service
            .create(&ctx(), create_request("C", Some(b.id)))
            .await
            .unwrap();

        let before = h.repository.all();
        let request = UpdateCategoryRequest {
            parent_id: Some(Some(c.id)),
            ..Default::default()
        };
        let result = h.service.update(&ctx(), a.id, request).await;
        assert!(matches!(
            result.unwrap_err(),
            CategoryError::CircularReference
        ));

        // Hierarchy untouched.
        let after = h.repository.all();
        let lookup: HashMap<Uuid, &Category> = after.iter().map(|c| (c.id, c)).collect();
        for category in &before {
            assert_eq!(lookup[&category.id].parent_id, category.parent_id);
            assert_eq!(lookup[&category.id].children, category.children);
        }
        assert_acyclic(&after);
    }

    #[tokio::test]
    async fn test_reparent_to_self_is_rejected() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let request = UpdateCategoryRequest {
            parent_id: Some(Some(a.id)),
            ..Default::default()
        };
        let result = h.service.update(&ctx(), a.id, request).await;
        assert!(matches!(
            result.unwrap_err(),
            CategoryError::CircularReference
        ));
    }

    #[tokio::test]
    async fn test_reparent_to_none_makes_root() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h
            .service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();

        let request = UpdateCategoryRequest {
            parent_id: Some(None),
            ..Default::default()
        };
        let detached = h.service.update(&ctx(), b.id, request).await.unwrap();

        assert!(detached.parent_id.is_none());
        let stored_a = h.service.get(a.id).await.unwrap();
        assert!(!stored_a.children.contains(&b.id));
        assert_mirror_consistent(&h.repository.all());
    }

    #[tokio::test]
    async fn test_reparent_to_current_parent_does_not_duplicate_children() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h
            .service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();

        let request = UpdateCategoryRequest {
            parent_id: Some(Some(a.id)),
            ..Default::default()
        };
        h.service.update(&ctx(), b.id, request).await.unwrap();

        let stored_a = h.service.get(a.id).await.unwrap();
        assert_eq!(
            stored_a.children.iter().filter(|c| **c == b.id).count(),
            1
        );
        assert_mirror_consistent(&h.repository.all());
    }

    #[tokio::test]
    async fn test_rename_audit_contains_only_changed_fields() {
        let h = harness();
        let created = h.service.create(&ctx(), create_request("Old", None)).await.unwrap();

        // is_active is already true: it must not appear in the change map.
        let request = UpdateCategoryRequest {
            name: Some("New".to_string()),
            is_active: Some(true),
            ..Default::default()
        };
        h.service.update(&ctx(), created.id, request).await.unwrap();

        let entries = h.audit_log.recorded();
        let entry = entries.last().unwrap();
        assert_eq!(entry.action, "category.update");
        let changes = entry.changes.as_object().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes["name"],
            json!({ "oldValue": "Old", "newValue": "New" })
        );
    }

    #[tokio::test]
    async fn test_rename_keeps_creation_slug() {
        let h = harness();
        let created = h
            .service
            .create(&ctx(), create_request("Original Name", None))
            .await
            .unwrap();

        let request = UpdateCategoryRequest {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let renamed = h.service.update(&ctx(), created.id, request).await.unwrap();

        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.slug, "original-name");
    }

    #[tokio::test]
    async fn test_rename_to_existing_name_is_rejected() {
        let h = harness();
        h.service.create(&ctx(), create_request("Shoes", None)).await.unwrap();
        let other = h.service.create(&ctx(), create_request("Bags", None)).await.unwrap();

        let request = UpdateCategoryRequest {
            name: Some("SHOES".to_string()),
            ..Default::default()
        };
        let result = h.service.update(&ctx(), other.id, request).await;
        assert!(matches!(result.unwrap_err(), CategoryError::DuplicateName));
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let h = harness();
        let created = h.service.create(&ctx(), create_request("Shoes", None)).await.unwrap();

        let request = UpdateCategoryRequest {
            name: Some("Shoes".to_string()),
            ..Default::default()
        };
        assert!(h.service.update(&ctx(), created.id, request).await.is_ok());
    }

    #[tokio::test]
    async fn test_cascading_delete_removes_whole_subtree() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h
            .service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();
        let c = h
            .service
            .create(&ctx(), create_request("C", Some(a.id)))
            .await
            .unwrap();
        let d = h
            .service
            .create(&ctx(), create_request("D", Some(b.id)))
            .await
            .unwrap();
        let survivor = h.service.create(&ctx(), create_request("E", None)).await.unwrap();

        let deletion = h.service.delete(&ctx(), a.id).await.unwrap();
        assert_eq!(deletion.deleted_ids.len(), 4);
        for id in [a.id, b.id, c.id, d.id] {
            assert!(deletion.deleted_ids.contains(&id));
            assert!(matches!(
                h.service.get(id).await.unwrap_err(),
                CategoryError::NotFound
            ));
        }

        // The unrelated root survives and references nothing deleted.
        let remaining = h.repository.all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, survivor.id);
        assert_mirror_consistent(&remaining);
    }

    #[tokio::test]
    async fn test_delete_detaches_root_from_former_parent() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h
            .service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();

        h.service.delete(&ctx(), b.id).await.unwrap();

        let stored_a = h.service.get(a.id).await.unwrap();
        assert!(stored_a.children.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_category_is_not_found() {
        let h = harness();
        let result = h.service.delete(&ctx(), Uuid::new_v4()).await;
        assert!(matches!(result.unwrap_err(), CategoryError::NotFound));

        let entries = h.audit_log.recorded();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AuditStatus::Failure);
    }

    #[tokio::test]
    async fn test_delete_records_deletion_audit_with_count() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        h.service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();

        h.service.delete(&ctx(), a.id).await.unwrap();

        let entry = h.audit_log.recorded().into_iter().last().unwrap();
        assert_eq!(entry.action, "category.delete");
        assert_eq!(entry.metadata["deleted_count"], json!(2));
        assert_eq!(
            entry.changes["name"],
            json!({ "oldValue": "A", "newValue": null })
        );
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_the_mutation() {
        let repository = Arc::new(MockCategoryRepository::new());
        let audit_log = Arc::new(MockAuditRepository::with_failure());
        let service = CategoryServiceImpl::new(
            repository,
            Arc::new(AuditRecorder::new(audit_log.clone())),
        );

        let created = service.create(&ctx(), create_request("Shoes", None)).await;
        assert!(created.is_ok());
        assert!(audit_log.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_repository_failure_surfaces_as_database_error() {
        let repository = Arc::new(MockCategoryRepository::with_failure());
        let audit_log = Arc::new(MockAuditRepository::new());
        let service = CategoryServiceImpl::new(
            repository,
            Arc::new(AuditRecorder::new(audit_log)),
        );

        let result = service.create(&ctx(), create_request("Shoes", None)).await;
        assert!(matches!(
            result.unwrap_err(),
            CategoryError::DatabaseError(_)
        ));
    }

    #[tokio::test]
    async fn test_hierarchy_stays_acyclic_and_consistent_across_operations() {
        let h = harness();
        let a = h.service.create(&ctx(), create_request("A", None)).await.unwrap();
        let b = h
            .service
            .create(&ctx(), create_request("B", Some(a.id)))
            .await
            .unwrap();
        let c = h
            .service
            .create(&ctx(), create_request("C", Some(b.id)))
            .await
            .unwrap();
        let d = h.service.create(&ctx(), create_request("D", None)).await.unwrap();

        // Legal moves interleaved with rejected ones.
        let moves: Vec<(Uuid, Option<Uuid>)> = vec![
            (c.id, Some(a.id)),
            (b.id, Some(d.id)),
            (a.id, Some(b.id)),
            (d.id, None),
            (c.id, Some(d.id)),
        ];
        for (target, parent) in moves {
            let request = UpdateCategoryRequest {
                parent_id: Some(parent),
                ..Default::default()
            };
            let _ = h.service.update(&ctx(), target, request).await;
            let categories = h.repository.all();
            assert_acyclic(&categories);
            assert_mirror_consistent(&categories);
        }
    }

    #[tokio::test]
    async fn test_list_table_annotates_counts() {
        let h = harness();
        let root = h.service.create(&ctx(), create_request("Root", None)).await.unwrap();
        h.service
            .create(&ctx(), create_request("Child", Some(root.id)))
            .await
            .unwrap();
        h.repository
            .product_counts
            .lock()
            .unwrap()
            .insert(root.id, 3);

        let rows = h.service.list_table().await.unwrap();
        let root_row = rows.iter().find(|r| r.category.id == root.id).unwrap();
        assert_eq!(root_row.child_count, 1);
        assert_eq!(root_row.product_count, 3);
    }
}
