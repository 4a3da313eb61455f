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
use crate::models::hero::{CreateHeroRequest, HeroSlide, UpdateHeroRequest};
use crate::permissions::perm;
use crate::services::hero_service::{HeroError, HeroService};

impl IntoResponse for HeroError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            HeroError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            HeroError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            HeroError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing hero slides
#[utoipa::path(
    get,
    path = "/api/heroes",
    responses(
        (status = 200, description = "List of hero slides", body = Vec<HeroSlide>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "heroes"
)]
pub async fn list_heroes_handler(
    State(hero_service): State<Arc<dyn HeroService>>,
) -> Result<Json<Vec<HeroSlide>>, Response> {
    match hero_service.list().await {
        Ok(slides) => Ok(Json(slides)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a hero slide
#[utoipa::path(
    post,
    path = "/api/heroes",
    request_body = CreateHeroRequest,
    responses(
        (status = 201, description = "Hero slide successfully created", body = HeroSlide),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "heroes"
)]
pub async fn create_hero_handler(
    State(hero_service): State<Arc<dyn HeroService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateHeroRequest>,
) -> Result<(StatusCode, Json<HeroSlide>), Response> {
    require(&employee, perm::HEROES_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match hero_service.create(&ctx, request).await {
        Ok(slide) => Ok((StatusCode::CREATED, Json(slide))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a hero slide
#[utoipa::path(
    put,
    path = "/api/heroes/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    request_body = UpdateHeroRequest,
    responses(
        (status = 200, description = "Hero slide successfully updated", body = HeroSlide),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Hero slide not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "heroes"
)]
pub async fn update_hero_handler(
    State(hero_service): State<Arc<dyn HeroService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateHeroRequest>,
) -> Result<Json<HeroSlide>, Response> {
    require(&employee, perm::HEROES_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match hero_service.update(&ctx, id, request).await {
        Ok(slide) => Ok(Json(slide)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a hero slide
#[utoipa::path(
    delete,
    path = "/api/heroes/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    responses(
        (status = 204, description = "Hero slide successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Hero slide not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "heroes"
)]
pub async fn delete_hero_handler(
    State(hero_service): State<Arc<dyn HeroService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::HEROES_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match hero_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
