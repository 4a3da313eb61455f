use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::order::{Order, OrderItem, OrderStatus};
use crate::repositories::RepositoryError;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;
    async fn insert(&self, order: &Order) -> Result<Order, RepositoryError>;
    async fn update(&self, order: &Order) -> Result<Order, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Stored shape; line items live in a JSONB column.
#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    items: Json<Vec<OrderItem>>,
    status: OrderStatus,
    shipping_address: String,
    shipping_cost: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            customer_id: row.customer_id,
            items: row.items.0,
            status: row.status,
            shipping_address: row.shipping_address,
            shipping_cost: row.shipping_cost,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of OrderRepository.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, customer_id, items, status, shipping_address, shipping_cost, \
                              total, created_at, updated_at";

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn insert(&self, order: &Order) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders \
                 (id, customer_id, items, status, shipping_address, shipping_cost, total, \
                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(order.id)
        .bind(order.customer_id)
        .bind(Json(&order.items))
        .bind(order.status)
        .bind(&order.shipping_address)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders \
             SET items = $2, status = $3, shipping_address = $4, shipping_cost = $5, total = $6, \
                 updated_at = $7 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(order.id)
        .bind(Json(&order.items))
        .bind(order.status)
        .bind(&order.shipping_address)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(order.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
