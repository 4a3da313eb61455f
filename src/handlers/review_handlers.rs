use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{audit_context, require, validation_error_response, ErrorResponse};
use crate::middleware::request_meta::RequestMeta;
use crate::models::auth::AuthenticatedEmployee;
use crate::models::review::{Review, UpdateReviewRequest};
use crate::permissions::perm;
use crate::services::review_service::{ReviewError, ReviewService};

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            ReviewError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ReviewError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ReviewError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing reviews
#[utoipa::path(
    get,
    path = "/api/reviews",
    responses(
        (status = 200, description = "List of reviews", body = Vec<Review>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn list_reviews_handler(
    State(review_service): State<Arc<dyn ReviewService>>,
) -> Result<Json<Vec<Review>>, Response> {
    match review_service.list().await {
        Ok(reviews) => Ok(Json(reviews)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for moderating a review (rating fix, comment edit, approval)
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review successfully updated", body = Review),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn update_review_handler(
    State(review_service): State<Arc<dyn ReviewService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, Response> {
    require(&employee, perm::REVIEWS_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match review_service.update(&ctx, id, request).await {
        Ok(review) => Ok(Json(review)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a review
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn delete_review_handler(
    State(review_service): State<Arc<dyn ReviewService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::REVIEWS_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match review_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
