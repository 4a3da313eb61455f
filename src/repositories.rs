pub mod audit_repository;
pub mod brand_repository;
pub mod category_repository;
pub mod customer_repository;
pub mod employee_repository;
pub mod hero_repository;
pub mod order_repository;
pub mod product_repository;
pub mod review_repository;
pub mod shipping_repository;

/// Store-layer errors shared by every repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db_err.to_string())
            }
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}
