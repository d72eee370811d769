use crate::auth::models::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use docket_core::models::{CreatePartnerRequest, PartnerResponse};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/v1/partners",
    tag = "partners",
    responses(
        (status = 200, description = "Tenant partners with their bank accounts", body = Vec<PartnerResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_partners(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PartnerResponse>>, HttpAppError> {
    let partners = state
        .db
        .partner_repository
        .list(tenant_ctx.tenant_id)
        .await?;
    Ok(Json(partners))
}

/// Create a partner together with its bank accounts. Either everything is
/// stored or nothing is.
#[utoipa::path(
    post,
    path = "/api/v1/partners",
    tag = "partners",
    request_body = CreatePartnerRequest,
    responses(
        (status = 201, description = "Partner created", body = PartnerResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create_partner(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreatePartnerRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let partner = state
        .db
        .partner_repository
        .create(tenant_ctx.tenant_id, &request)
        .await?;

    tracing::info!(
        partner_id = %partner.id,
        bank_accounts = partner.bank_accounts.len(),
        "Partner created"
    );

    Ok((StatusCode::CREATED, Json(partner)))
}
