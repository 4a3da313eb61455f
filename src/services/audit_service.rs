//! Change diffing and the append-only audit trail.
//!
//! Every mutating service builds before/after snapshots of the entity as
//! `serde_json::Value`, narrows them to a field-level change map here, and
//! hands the result to [`AuditRecorder`]. Recording never fails the primary
//! mutation: persistence errors are logged and swallowed.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::audit::{AuditContext, AuditEntry, AuditLogFilter, AuditStatus, NewAuditEntry};
use crate::repositories::audit_repository::AuditRepository;

/// Structural diff between two entity snapshots, scoped to `fields`.
///
/// A field appears in the result only when its values are structurally
/// unequal; each entry is `{"oldValue": .., "newValue": ..}`. Fields absent
/// from a snapshot compare as `null`, so `diff(x, x, fields)` is always empty.
pub fn diff<'a>(
    before: &Value,
    after: &Value,
    fields: impl IntoIterator<Item = &'a str>,
) -> Map<String, Value> {
    let mut changes = Map::new();
    for field in fields {
        let old_value = before.get(field).cloned().unwrap_or(Value::Null);
        let new_value = after.get(field).cloned().unwrap_or(Value::Null);
        if old_value != new_value {
            changes.insert(
                field.to_string(),
                json!({ "oldValue": old_value, "newValue": new_value }),
            );
        }
    }
    changes
}

/// Change map for a create: every field of the snapshot, old value `null`.
pub fn creation_changes(after: &Value) -> Map<String, Value> {
    snapshot_changes(after, |value| json!({ "oldValue": Value::Null, "newValue": value }))
}

/// Change map for a delete: every field of the snapshot, new value `null`.
pub fn deletion_changes(before: &Value) -> Map<String, Value> {
    snapshot_changes(before, |value| json!({ "oldValue": value, "newValue": Value::Null }))
}

fn snapshot_changes(snapshot: &Value, entry: impl Fn(Value) -> Value) -> Map<String, Value> {
    match snapshot.as_object() {
        Some(fields) => fields
            .iter()
            .map(|(name, value)| (name.clone(), entry(value.clone())))
            .collect(),
        None => Map::new(),
    }
}

/// Persists audit entries without ever propagating a failure to the mutation
/// that produced them.
pub struct AuditRecorder {
    repository: Arc<dyn AuditRepository>,
}

impl AuditRecorder {
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    /// Records a successful mutation. A success entry must always name its
    /// target: calls without a target id are suppressed rather than stored
    /// with a missing reference.
    pub async fn success(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_model: &str,
        target_id: Option<Uuid>,
        changes: Map<String, Value>,
        metadata: Value,
    ) {
        let Some(target_id) = target_id else {
            tracing::warn!(action, target_model, "suppressing success audit entry without target id");
            return;
        };
        self.persist(NewAuditEntry {
            actor_id: ctx.actor_id,
            actor_name: ctx.actor_name.clone(),
            action: action.to_string(),
            target_model: target_model.to_string(),
            target_id: Some(target_id),
            changes: Value::Object(changes),
            metadata,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            status: AuditStatus::Success,
            error_message: None,
        })
        .await;
    }

    /// Records a failed mutation attempt; the target may be unknown.
    pub async fn failure(
        &self,
        ctx: &AuditContext,
        action: &str,
        target_model: &str,
        target_id: Option<Uuid>,
        error_message: &str,
    ) {
        self.persist(NewAuditEntry {
            actor_id: ctx.actor_id,
            actor_name: ctx.actor_name.clone(),
            action: action.to_string(),
            target_model: target_model.to_string(),
            target_id,
            changes: Value::Object(Map::new()),
            metadata: Value::Object(Map::new()),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            status: AuditStatus::Failure,
            error_message: Some(error_message.to_string()),
        })
        .await;
    }

    async fn persist(&self, entry: NewAuditEntry) {
        if let Err(error) = self.repository.insert(&entry).await {
            tracing::warn!(
                action = %entry.action,
                target_model = %entry.target_model,
                %error,
                "failed to persist audit entry"
            );
        }
    }
}

/// Audit log listing errors.
#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Read side of the audit trail.
#[async_trait]
pub trait AuditLogService: Send + Sync {
    async fn list(&self, filter: AuditLogFilter) -> Result<Vec<AuditEntry>, AuditLogError>;
}

pub struct AuditLogServiceImpl {
    repository: Arc<dyn AuditRepository>,
}

impl AuditLogServiceImpl {
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AuditLogService for AuditLogServiceImpl {
    async fn list(&self, filter: AuditLogFilter) -> Result<Vec<AuditEntry>, AuditLogError> {
        self.repository
            .list(&filter)
            .await
            .map_err(|e| AuditLogError::DatabaseError(e.to_string()))
    }
}

/// In-memory AuditRepository used across the service test suites.
#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::repositories::RepositoryError;
    use chrono::Utc;
    use std::sync::Mutex;

    pub struct MockAuditRepository {
        pub entries: Mutex<Vec<AuditEntry>>,
        should_fail: bool,
    }

    impl MockAuditRepository {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(Vec::new()),
                should_fail: false,
            }
        }

        pub fn with_failure() -> Self {
            Self {
                entries: Mutex::new(Vec::new()),
                should_fail: true,
            }
        }

        pub fn recorded(&self) -> Vec<AuditEntry> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuditRepository for MockAuditRepository {
        async fn insert(&self, entry: &NewAuditEntry) -> Result<AuditEntry, RepositoryError> {
            if self.should_fail {
                return Err(RepositoryError::DatabaseError(
                    "Database connection failed".to_string(),
                ));
            }
            let stored = AuditEntry {
                id: Uuid::new_v4(),
                actor_id: entry.actor_id,
                actor_name: entry.actor_name.clone(),
                action: entry.action.clone(),
                target_model: entry.target_model.clone(),
                target_id: entry.target_id,
                changes: entry.changes.clone(),
                metadata: entry.metadata.clone(),
                ip_address: entry.ip_address.clone(),
                user_agent: entry.user_agent.clone(),
                status: entry.status,
                error_message: entry.error_message.clone(),
                created_at: Utc::now(),
            };
            self.entries.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn list(&self, filter: &AuditLogFilter) -> Result<Vec<AuditEntry>, RepositoryError> {
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .iter()
                .filter(|e| {
                    filter
                        .target_model
                        .as_ref()
                        .is_none_or(|m| &e.target_model == m)
                })
                .filter(|e| filter.actor_id.is_none_or(|a| e.actor_id == a))
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockAuditRepository;
    use super::*;

    fn ctx() -> AuditContext {
        AuditContext {
            actor_id: Uuid::new_v4(),
            actor_name: "Test Admin".to_string(),
            ip_address: Some("192.0.2.1".to_string()),
            user_agent: Some("tests".to_string()),
        }
    }

    #[test]
    fn test_diff_identical_snapshots_is_empty() {
        let snapshot = json!({
            "name": "Shoes",
            "is_active": true,
            "images": ["a.png", "b.png"],
            "nested": { "x": 1 }
        });
        let changes = diff(&snapshot, &snapshot, ["name", "is_active", "images", "nested"]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let before = json!({ "name": "Old", "is_active": true });
        let after = json!({ "name": "New", "is_active": true });
        let changes = diff(&before, &after, ["name", "is_active"]);

        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes["name"],
            json!({ "oldValue": "Old", "newValue": "New" })
        );
    }

    #[test]
    fn test_diff_is_structural_not_referential() {
        let before = json!({ "images": ["a.png", "b.png"] });
        let after = json!({ "images": ["a.png", "b.png"] });
        assert!(diff(&before, &after, ["images"]).is_empty());

        let reordered = json!({ "images": ["b.png", "a.png"] });
        assert_eq!(diff(&before, &reordered, ["images"]).len(), 1);
    }

    #[test]
    fn test_diff_treats_missing_fields_as_null() {
        let before = json!({ "name": "Shoes" });
        let after = json!({ "name": "Shoes", "image": "shoes.png" });
        let changes = diff(&before, &after, ["image"]);
        assert_eq!(
            changes["image"],
            json!({ "oldValue": null, "newValue": "shoes.png" })
        );
    }

    #[test]
    fn test_diff_scopes_to_requested_fields() {
        let before = json!({ "name": "Old", "image": "old.png" });
        let after = json!({ "name": "New", "image": "new.png" });
        let changes = diff(&before, &after, ["name"]);
        assert_eq!(changes.len(), 1);
        assert!(!changes.contains_key("image"));
    }

    #[test]
    fn test_creation_changes_have_null_old_values() {
        let snapshot = json!({ "name": "Shoes", "is_active": true });
        let changes = creation_changes(&snapshot);
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes["name"],
            json!({ "oldValue": null, "newValue": "Shoes" })
        );
    }

    #[test]
    fn test_deletion_changes_have_null_new_values() {
        let snapshot = json!({ "name": "Shoes" });
        let changes = deletion_changes(&snapshot);
        assert_eq!(
            changes["name"],
            json!({ "oldValue": "Shoes", "newValue": null })
        );
    }

    #[tokio::test]
    async fn test_success_entry_is_recorded() {
        let repository = Arc::new(MockAuditRepository::new());
        let recorder = AuditRecorder::new(repository.clone());

        let target = Uuid::new_v4();
        let mut changes = Map::new();
        changes.insert(
            "name".to_string(),
            json!({ "oldValue": "Old", "newValue": "New" }),
        );
        recorder
            .success(
                &ctx(),
                "category.update",
                "Category",
                Some(target),
                changes,
                json!({ "fields": ["name"] }),
            )
            .await;

        let recorded = repository.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].action, "category.update");
        assert_eq!(recorded[0].target_id, Some(target));
        assert_eq!(recorded[0].status, AuditStatus::Success);
        assert!(recorded[0].error_message.is_none());
    }

    #[tokio::test]
    async fn test_success_without_target_is_suppressed() {
        let repository = Arc::new(MockAuditRepository::new());
        let recorder = AuditRecorder::new(repository.clone());

        recorder
            .success(&ctx(), "category.update", "Category", None, Map::new(), json!({}))
            .await;

        assert!(repository.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_failure_entry_may_lack_target() {
        let repository = Arc::new(MockAuditRepository::new());
        let recorder = AuditRecorder::new(repository.clone());

        recorder
            .failure(&ctx(), "category.create", "Category", None, "duplicate name")
            .await;

        let recorded = repository.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].status, AuditStatus::Failure);
        assert_eq!(recorded[0].error_message.as_deref(), Some("duplicate name"));
        assert!(recorded[0].target_id.is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed() {
        let repository = Arc::new(MockAuditRepository::with_failure());
        let recorder = AuditRecorder::new(repository.clone());

        // Must not panic or surface the error in any way.
        recorder
            .success(
                &ctx(),
                "category.update",
                "Category",
                Some(Uuid::new_v4()),
                Map::new(),
                json!({}),
            )
            .await;
        recorder
            .failure(&ctx(), "category.delete", "Category", None, "boom")
            .await;

        assert!(repository.recorded().is_empty());
    }
}
