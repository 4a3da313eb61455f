use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::employee::Employee;
use crate::repositories::RepositoryError;

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Employee>, RepositoryError>;
    async fn insert(&self, employee: &Employee) -> Result<Employee, RepositoryError>;
    async fn update(&self, employee: &Employee) -> Result<Employee, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of EmployeeRepository.
pub struct PostgresEmployeeRepository {
    pool: PgPool,
}

impl PostgresEmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, name, email, password_hash, permissions, is_active, created_at, updated_at";

#[async_trait]
impl EmployeeRepository for PostgresEmployeeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, RepositoryError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {SELECT_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {SELECT_COLUMNS} FROM employees WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_all(&self) -> Result<Vec<Employee>, RepositoryError> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {SELECT_COLUMNS} FROM employees ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    async fn insert(&self, employee: &Employee) -> Result<Employee, RepositoryError> {
        let inserted = sqlx::query_as::<_, Employee>(&format!(
            "INSERT INTO employees \
                 (id, name, email, password_hash, permissions, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(&employee.permissions)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update(&self, employee: &Employee) -> Result<Employee, RepositoryError> {
        let updated = sqlx::query_as::<_, Employee>(&format!(
            "UPDATE employees \
             SET name = $2, email = $3, password_hash = $4, permissions = $5, is_active = $6, \
                 updated_at = $7 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(&employee.permissions)
        .bind(employee.is_active)
        .bind(employee.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
