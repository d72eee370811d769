use crate::auth::models::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use docket_core::models::{Account, CreateAccountRequest};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Tenant bank accounts", body = Vec<Account>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_accounts(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, HttpAppError> {
    let accounts = state
        .db
        .account_repository
        .list(tenant_ctx.tenant_id)
        .await?;
    Ok(Json(accounts))
}

#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create_account(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let account = state
        .db
        .account_repository
        .create(tenant_ctx.tenant_id, &request)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}
