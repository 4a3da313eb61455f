use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::services::auth_service::AuthService;

/// Auth middleware that validates bearer tokens and adds the resolved
/// employee (with a fresh permission set) to the request extensions.
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidTokenFormat)?;

    let employee = auth_service
        .authenticate(token)
        .await
        .map_err(|e| match e {
            crate::services::auth_service::AuthError::TokenExpired => AuthError::TokenExpired,
            crate::services::auth_service::AuthError::AccountDisabled => AuthError::AccountDisabled,
            _ => AuthError::InvalidToken,
        })?;

    request.extensions_mut().insert(employee);

    Ok(next.run(request).await)
}

/// Auth middleware errors
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    TokenExpired,
    AccountDisabled,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidTokenFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format. Expected: Bearer <token>",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or malformed token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired"),
            AuthError::AccountDisabled => (StatusCode::FORBIDDEN, "Account is disabled"),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{AuthenticatedEmployee, LoginRequest};
    use crate::services::auth_service::testing::{employee_fixture, MockEmployeeRepository};
    use crate::services::auth_service::AuthServiceImpl;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn protected_handler(
        axum::Extension(employee): axum::Extension<AuthenticatedEmployee>,
    ) -> impl IntoResponse {
        Json(json!({
            "employee_id": employee.employee_id.to_string(),
            "permissions": employee.permissions,
        }))
    }

    fn create_test_app(auth_service: Arc<dyn AuthService>) -> Router {
        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            ))
            .with_state(auth_service)
    }

    async fn setup() -> (Arc<dyn AuthService>, String) {
        let repository = Arc::new(MockEmployeeRepository::new());
        repository.add(employee_fixture(
            "admin@example.com",
            "password123",
            &["categories.*"],
        ));
        let auth_service: Arc<dyn AuthService> =
            Arc::new(AuthServiceImpl::new(repository, "test_secret".to_string()));
        let token = auth_service
            .login(LoginRequest {
                email: "admin@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        (auth_service, token.token)
    }

    #[tokio::test]
    async fn test_middleware_with_valid_token() {
        let (auth_service, token) = setup().await;
        let app = create_test_app(auth_service);

        let request = HttpRequest::builder()
            .uri("/protected")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body_json["permissions"], json!(["categories.*"]));
    }

    #[tokio::test]
    async fn test_middleware_without_token() {
        let (auth_service, _) = setup().await;
        let app = create_test_app(auth_service);

        let request = HttpRequest::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_token() {
        let (auth_service, _) = setup().await;
        let app = create_test_app(auth_service);

        let request = HttpRequest::builder()
            .uri("/protected")
            .header("Authorization", "Bearer invalid_token_here")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_header() {
        let (auth_service, _) = setup().await;
        let app = create_test_app(auth_service);

        let request = HttpRequest::builder()
            .uri("/protected")
            .header("Authorization", "some_token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body_json["error"]
            .as_str()
            .unwrap()
            .contains("Invalid authorization header format"));
    }
}
