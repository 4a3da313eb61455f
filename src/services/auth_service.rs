use async_trait::async_trait;
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::auth::{AuthToken, AuthenticatedEmployee, LoginRequest};
use crate::repositories::employee_repository::EmployeeRepository;

const TOKEN_LIFETIME_HOURS: i64 = 24;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // employee id
    exp: i64,    // expiration timestamp
}

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Login and bearer-token resolution for back-office employees.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and issue a JWT.
    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError>;

    /// Validate a JWT and resolve the employee behind it, with a fresh
    /// permission set.
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedEmployee, AuthError>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    employee_repository: Arc<dyn EmployeeRepository>,
    jwt_secret: String,
}

impl AuthServiceImpl {
    pub fn new(employee_repository: Arc<dyn EmployeeRepository>, jwt_secret: String) -> Self {
        Self {
            employee_repository,
            jwt_secret,
        }
    }

    fn generate_jwt(&self, employee_id: Uuid) -> Result<AuthToken, AuthError> {
        let expires_at = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS);
        let claims = Claims {
            sub: employee_id.to_string(),
            exp: expires_at.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::DatabaseError(format!("Token generation failed: {}", e)))?;
        Ok(AuthToken { token, expires_at })
    }

    fn decode_jwt(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError> {
        let employee = self
            .employee_repository
            .find_by_email(&request.email)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_matches = verify(&request.password, &employee.password_hash)
            .map_err(|e| AuthError::DatabaseError(format!("Password verification failed: {}", e)))?;
        if !password_matches {
            return Err(AuthError::InvalidCredentials);
        }
        if !employee.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.generate_jwt(employee.id)
    }

    async fn authenticate(&self, token: &str) -> Result<AuthenticatedEmployee, AuthError> {
        let employee_id = self.decode_jwt(token)?;

        let employee = self
            .employee_repository
            .find_by_id(employee_id)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidToken)?;
        if !employee.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(AuthenticatedEmployee {
            employee_id: employee.id,
            name: employee.name,
            permissions: employee.permissions,
        })
    }
}
