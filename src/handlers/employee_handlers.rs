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
use crate::models::employee::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
use crate::permissions::perm;
use crate::services::employee_service::{EmployeeError, EmployeeService};

impl IntoResponse for EmployeeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            EmployeeError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            EmployeeError::DuplicateEmail => (StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL"),
            EmployeeError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            EmployeeError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let body = ErrorResponse::new(error_type, &self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler for listing employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "List of employees", body = Vec<Employee>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn list_employees_handler(
    State(employee_service): State<Arc<dyn EmployeeService>>,
) -> Result<Json<Vec<Employee>>, Response> {
    match employee_service.list().await {
        Ok(employees) => Ok(Json(employees)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching a single employee
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "The employee", body = Employee),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn get_employee_handler(
    State(employee_service): State<Arc<dyn EmployeeService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, Response> {
    match employee_service.get(id).await {
        Ok(employee) => Ok(Json(employee)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating an employee account
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee successfully created", body = Employee),
        (status = 400, description = "Duplicate email or invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn create_employee_handler(
    State(employee_service): State<Arc<dyn EmployeeService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Json(request): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), Response> {
    require(&employee, perm::EMPLOYEES_CREATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match employee_service.create(&ctx, request).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating an employee (profile, permission set, active flag)
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee successfully updated", body = Employee),
        (status = 400, description = "Duplicate email or invalid payload", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn update_employee_handler(
    State(employee_service): State<Arc<dyn EmployeeService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, Response> {
    require(&employee, perm::EMPLOYEES_UPDATE)?;

    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let ctx = audit_context(&employee, &meta);
    match employee_service.update(&ctx, id, request).await {
        Ok(updated) => Ok(Json(updated)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting an employee account
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee successfully deleted"),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn delete_employee_handler(
    State(employee_service): State<Arc<dyn EmployeeService>>,
    Extension(employee): Extension<AuthenticatedEmployee>,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    require(&employee, perm::EMPLOYEES_DELETE)?;

    let ctx = audit_context(&employee, &meta);
    match employee_service.delete(&ctx, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
