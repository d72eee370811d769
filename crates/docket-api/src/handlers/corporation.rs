use crate::auth::models::TenantContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use docket_core::models::{CorporationLookup, CorporationQuery};
use docket_core::AppError;
use std::sync::Arc;

/// Look a counterparty up in the corporate registries, typically to prefill a
/// partner from an invoice registration number.
#[utoipa::path(
    get,
    path = "/api/v1/corporation",
    tag = "corporation",
    params(CorporationQuery),
    responses(
        (status = 200, description = "Registry entries for the number", body = CorporationLookup),
        (status = 400, description = "corporateNumber missing", body = ErrorResponse),
        (status = 404, description = "Unknown corporate number", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(tenant_id = %tenant_ctx.tenant_id))]
pub async fn get_corporation(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CorporationQuery>,
) -> Result<Json<CorporationLookup>, HttpAppError> {
    let number = query.normalized_number().ok_or_else(|| {
        AppError::InvalidInput("corporateNumber query parameter is required".to_string())
    })?;

    let lookup = state
        .db
        .corporation_repository
        .lookup(&number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No corporation found for {}", number)))?;

    Ok(Json(lookup))
}
