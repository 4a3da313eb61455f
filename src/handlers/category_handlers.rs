use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{audit_context, require, validation_error_response, ErrorResponse};
use crate::middleware::request_meta::RequestMeta;
use crate::models::auth::AuthenticatedEmployee;
use crate::models::category::{
    Category, CategoryTableRow, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::permissions::perm;
use crate::services::category_service::{CategoryError, CategoryService};

/// Convert CategoryError to HTTP response
impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            CategoryError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CategoryError::DuplicateName => (StatusCode::BAD_REQUEST, "DUPLICATE_NAME"),
            CategoryError::CircularReference => (StatusCode::BAD_REQUEST, "CIRCULAR_REFERENCE"),
            CategoryError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            CategoryError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListCategoriesQuery {
    /// `table` (default) or `tree`.
    pub view: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteCategoryResponse {
    pub message: String,
    pub deleted_count: usize,
}

/// Handler for listing categories
///
/// The table view is a flat list annotated with child and product counts; the
/// tree view returns the full set for the client to rebuild the nesting from
/// `parent_id`.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(
        ("view" = Option<String>, Query, description = "table (default) or tree")
    ),
    responses(
        (status = 200, description = "List of categories", body = Vec<CategoryTableRow>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Response, Response> {
    match query.view.as_deref() {
        Some("tree") => match category_service.list_tree().await {
            Ok(categories) => Ok(Json(categories).into_response()),
            Err(e) => Err(e.into_response()),
        },
        _ => match category_service.list_table().await {
            Ok(rows) => Ok(Json(rows).into_response()),
            Err(e) => Err(e.into_response()),
        },
    }
}

/// Handler for fetching a single category
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn get_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, Response> {
    match category_service.get(id).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category successfully created", body = Category),
        (status = 400, description = "Duplicate name or invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), Response> {
    require(&employee, perm::CATEGORIES_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match category_service.create(&ctx, request).await {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a category, including re-parenting
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category successfully updated", body = Category),
        (status = 400, description = "Cycle, duplicate name or invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, Response> {
    require(&employee, perm::CATEGORIES_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match category_service.update(&ctx, id, request).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a category and its whole subtree
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Subtree deleted", body = DeleteCategoryResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteCategoryResponse>, Response> {
    require(&employee, perm::CATEGORIES_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match category_service.delete(&ctx, id).await {
        Ok(deletion) => Ok(Json(DeleteCategoryResponse {
            message: "Category and its subcategories deleted".to_string(),
            deleted_count: deletion.deleted_ids.len(),
        })),
        Err(e) => Err(e.into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::AuditContext;
    use crate::models::category::CategoryDeletion;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{delete, post, put};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Canned-response CategoryService that counts how often it is reached.
    struct StubCategoryService {
        update_result: fn() -> Result<Category, CategoryError>,
        calls: AtomicUsize,
    }

    impl StubCategoryService {
        fn new(update_result: fn() -> Result<Category, CategoryError>) -> Self {
            Self {
                update_result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CategoryService for StubCategoryService {
        async fn list_table(&self) -> Result<Vec<CategoryTableRow>, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn list_tree(&self) -> Result<Vec<Category>, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn get(&self, _id: Uuid) -> Result<Category, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CategoryError::NotFound)
        }

        async fn create(
            &self,
            _ctx: &AuditContext,
            request: CreateCategoryRequest,
        ) -> Result<Category, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Category::test_fixture(Uuid::new_v4(), &request.name, None))
        }

        async fn update(
            &self,
            _ctx: &AuditContext,
            _id: Uuid,
            _request: UpdateCategoryRequest,
        ) -> Result<Category, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.update_result)()
        }

        async fn delete(
            &self,
            _ctx: &AuditContext,
            _id: Uuid,
        ) -> Result<CategoryDeletion, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CategoryDeletion {
                deleted_ids: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            })
        }
    }

    fn employee(permissions: &[&str]) -> AuthenticatedEmployee {
        AuthenticatedEmployee {
            employee_id: Uuid::new_v4(),
            name: "Test Admin".to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn app(service: Arc<StubCategoryService>, permissions: &[&str]) -> Router {
        let state: Arc<dyn CategoryService> = service;
        Router::new()
            .route("/api/categories", post(create_category_handler))
            .route("/api/categories/{id}", put(update_category_handler))
            .route("/api/categories/{id}", delete(delete_category_handler))
            .layer(Extension(employee(permissions)))
            .with_state(state)
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_cycle_rejection_maps_to_400_circular_reference() {
        let service = Arc::new(StubCategoryService::new(|| {
            Err(CategoryError::CircularReference)
        }));
        let app = app(service, &["categories.*"]);

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/categories/{}", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "parent_id": Uuid::new_v4() }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "CIRCULAR_REFERENCE");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("descendant the parent"));
    }

    #[tokio::test]
    async fn test_delete_reports_subtree_size() {
        let service = Arc::new(StubCategoryService::new(|| {
            Err(CategoryError::NotFound)
        }));
        let app = app(service, &["categories.*"]);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/categories/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["deleted_count"], 4);
    }

    #[tokio::test]
    async fn test_permission_denial_never_reaches_the_service() {
        let service = Arc::new(StubCategoryService::new(|| {
            Err(CategoryError::NotFound)
        }));
        let app = app(service.clone(), &["products.*"]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/categories")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "Shoes" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);

        let body = body_json(response).await;
        assert_eq!(body["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_before_the_service() {
        let service = Arc::new(StubCategoryService::new(|| {
            Err(CategoryError::NotFound)
        }));
        let app = app(service.clone(), &["categories.*"]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/categories")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);

        let body = body_json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_returns_201_with_category() {
        let service = Arc::new(StubCategoryService::new(|| {
            Err(CategoryError::NotFound)
        }));
        let app = app(service, &["categories.create"]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/categories")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "Shoes" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["name"], "Shoes");
        assert_eq!(body["slug"], "shoes");
    }
}
