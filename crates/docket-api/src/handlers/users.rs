use crate::auth::models::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docket_core::models::{BulkDeleteUsersRequest, User, UserRequest};
use docket_core::AppError;
use docket_db::UserInput;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Validate the body and borrow it as repository input.
fn user_input(request: &UserRequest) -> Result<UserInput<'_>, HttpAppError> {
    request.validate()?;
    let role = request.role().map_err(AppError::InvalidInput)?;
    Ok(UserInput {
        name: request.name.trim(),
        email: request.email.trim(),
        department: request.department.trim(),
        role,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Tenant users ordered by id", body = Vec<User>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_users(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, HttpAppError> {
    let users = state.db.user_repository.list(tenant_ctx.tenant_id).await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Missing field or unknown role", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create_user(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let input = user_input(&request)?;
    let user = state
        .db
        .user_repository
        .create(tenant_ctx.tenant_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Missing field or unknown role", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn update_user(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<Json<User>, HttpAppError> {
    let input = user_input(&request)?;
    let user = state
        .db
        .user_repository
        .update(tenant_ctx.tenant_id, id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(user))
}

/// Delete several users at once. Refused if it would leave the organization
/// with no users.
#[utoipa::path(
    post,
    path = "/api/v1/users/bulk-delete",
    tag = "users",
    request_body = BulkDeleteUsersRequest,
    responses(
        (status = 200, description = "Users deleted", body = BulkDeleteResponse),
        (status = 400, description = "No ids, or no user would remain", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(count = request.ids.len()))]
pub async fn bulk_delete_users(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<BulkDeleteUsersRequest>,
) -> Result<Json<BulkDeleteResponse>, HttpAppError> {
    let deleted = state
        .db
        .user_repository
        .bulk_delete(tenant_ctx.tenant_id, &request.ids)
        .await?;

    Ok(Json(BulkDeleteResponse { deleted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> UserRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn complete_request_becomes_input() {
        let req = request(json!({
            "name": " Sato ",
            "email": "sato@example.com",
            "department": "Accounting",
            "role": "ADMIN"
        }));
        let input = user_input(&req).unwrap();
        assert_eq!(input.name, "Sato");
        assert_eq!(input.role, docket_core::models::UserRole::Admin);
    }

    #[test]
    fn missing_role_is_rejected() {
        let req = request(json!({
            "name": "Sato",
            "email": "sato@example.com",
            "department": "Accounting"
        }));
        let err = user_input(&req).unwrap_err();
        assert!(matches!(err.0, AppError::InvalidInput(ref m) if m == "All fields are required"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let req = request(json!({
            "name": "Sato",
            "email": "sato@example.com",
            "department": "Accounting",
            "role": "OWNER"
        }));
        assert!(matches!(user_input(&req).unwrap_err().0, AppError::InvalidInput(_)));
    }
}
