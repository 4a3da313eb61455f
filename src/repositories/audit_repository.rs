use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::audit::{AuditEntry, AuditLogFilter, NewAuditEntry};
use crate::repositories::RepositoryError;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// Append-only store for audit entries. There is deliberately no update or
/// delete operation.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, entry: &NewAuditEntry) -> Result<AuditEntry, RepositoryError>;
    async fn list(&self, filter: &AuditLogFilter) -> Result<Vec<AuditEntry>, RepositoryError>;
}

/// PostgreSQL implementation of AuditRepository.
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, actor_id, actor_name, action, target_model, target_id, \
                              changes, metadata, ip_address, user_agent, status, error_message, \
                              created_at";

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn insert(&self, entry: &NewAuditEntry) -> Result<AuditEntry, RepositoryError> {
        let inserted = sqlx::query_as::<_, AuditEntry>(&format!(
            "INSERT INTO audit_logs \
                 (id, actor_id, actor_name, action, target_model, target_id, changes, metadata, \
                  ip_address, user_agent, status, error_message, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW()) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(entry.actor_id)
        .bind(&entry.actor_name)
        .bind(&entry.action)
        .bind(&entry.target_model)
        .bind(entry.target_id)
        .bind(&entry.changes)
        .bind(&entry.metadata)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.status)
        .bind(&entry.error_message)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list(&self, filter: &AuditLogFilter) -> Result<Vec<AuditEntry>, RepositoryError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM audit_logs WHERE 1 = 1"));

        if let Some(target_model) = &filter.target_model {
            query.push(" AND target_model = ").push_bind(target_model.clone());
        }
        if let Some(actor_id) = filter.actor_id {
            query.push(" AND actor_id = ").push_bind(actor_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND created_at <= ").push_bind(to);
        }

        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = filter.offset.unwrap_or(0).max(0);
        query.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let entries = query
            .build_query_as::<AuditEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}
