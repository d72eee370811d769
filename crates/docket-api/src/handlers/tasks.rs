use crate::auth::models::TenantContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, response::Json};
use docket_core::models::TaskStats;
use docket_core::AppError;
use std::sync::Arc;

/// Get aggregated task statistics
#[tracing::instrument(skip(state))]
pub async fn get_task_stats(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TaskStats>, HttpAppError> {
    tracing::debug!("Getting task statistics");

    let stats = state
        .tasks
        .task_repository
        .get_stats(tenant_ctx.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get task stats");
            AppError::Internal(e.to_string())
        })?;

    Ok(Json(stats))
}
