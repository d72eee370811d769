use crate::auth::models::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docket_core::models::{
    ExtractFileFieldsPayload, FileResponse, Priority, Task, TaskPayload, UpdateFileRequest,
};
use docket_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReprocessResponse {
    pub file_id: Uuid,
    /// New job id; absent when a job for the file was already waiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    pub already_queued: bool,
}

fn file_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("File {} not found", id))
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "files",
    responses(
        (status = 200, description = "Tenant files, newest first", body = Vec<FileResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_files(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileResponse>>, HttpAppError> {
    let records = state
        .files
        .repository
        .list_for_tenant(tenant_ctx.tenant_id)
        .await?;

    Ok(Json(records.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File found", body = FileResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_file(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FileResponse>, HttpAppError> {
    let record = state
        .files
        .repository
        .get_for_tenant(tenant_ctx.tenant_id, id)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    Ok(Json(FileResponse::from(record)))
}

/// Save reviewed field values. The record becomes `confirmed` whatever its
/// previous status.
#[utoipa::path(
    put,
    path = "/api/v1/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File confirmed", body = FileResponse),
        (status = 400, description = "A field value is invalid", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn update_file(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateFileRequest>,
) -> Result<Json<FileResponse>, HttpAppError> {
    let repository = &state.files.repository;

    let current = repository
        .get_for_tenant(tenant_ctx.tenant_id, id)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    let fields = request
        .apply_to(&current.fields)
        .map_err(AppError::InvalidInput)?;

    let record = repository
        .confirm(tenant_ctx.tenant_id, id, &fields)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    tracing::info!(file_id = %id, previous_status = %current.status, "File confirmed");

    Ok(Json(FileResponse::from(record)))
}

/// Queue extraction again for a record that is still `uploaded`, e.g. after
/// its job failed permanently.
#[utoipa::path(
    post,
    path = "/api/v1/files/{id}/reprocess",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 202, description = "Extraction queued", body = ReprocessResponse),
        (status = 400, description = "File has already been extracted", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn reprocess_file(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .files
        .repository
        .get_for_tenant(tenant_ctx.tenant_id, id)
        .await?
        .ok_or_else(|| file_not_found(id))?;

    if !record.status.is_pending_extraction() {
        return Err(AppError::InvalidInput(format!(
            "File is already {}; only uploaded files can be reprocessed",
            record.status
        ))
        .into());
    }

    let open = state
        .tasks
        .task_repository
        .has_open_task_for_file(tenant_ctx.tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, file_id = %id, "Failed to look up extraction jobs");
            AppError::Internal(e.to_string())
        })?;

    if open {
        tracing::info!(file_id = %id, "Extraction already queued");
        return Ok((
            StatusCode::ACCEPTED,
            Json(ReprocessResponse {
                file_id: id,
                task_id: None,
                already_queued: true,
            }),
        ));
    }

    let payload =
        Task::payload_from(&ExtractFileFieldsPayload { file_id: id }).map_err(AppError::from)?;
    let task_id = state
        .tasks
        .task_queue
        .submit_task(
            tenant_ctx.tenant_id,
            ExtractFileFieldsPayload::task_type(),
            payload,
            Priority::High,
            None,
        )
        .await?;

    tracing::info!(file_id = %id, task_id = %task_id, "Extraction requeued");

    Ok((
        StatusCode::ACCEPTED,
        Json(ReprocessResponse {
            file_id: id,
            task_id: Some(task_id),
            already_queued: false,
        }),
    ))
}
