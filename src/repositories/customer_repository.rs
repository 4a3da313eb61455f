use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::customer::Customer;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError>;
    async fn update(&self, customer: &Customer) -> Result<Customer, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of CustomerRepository.
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, name, email, phone, address, is_blocked, created_at, updated_at";

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let updated = sqlx::query_as::<_, Customer>(&format!(
            "UPDATE customers \
             SET name = $2, email = $3, phone = $4, address = $5, is_blocked = $6, updated_at = $7 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.is_blocked)
        .bind(customer.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
