use crate::auth::models::TenantContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadService;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_files;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docket_core::models::FileSummary;
use std::sync::Arc;

/// Upload one or more PDF invoices.
///
/// Each file is stored, recorded as `uploaded` and scheduled for field
/// extraction after a short random delay. Any non-PDF part rejects the whole
/// request before anything is stored.
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Files accepted", body = Vec<FileSummary>),
        (status = 400, description = "No file in the request", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "A file is not a PDF", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(tenant_id = %tenant_ctx.tenant_id))]
pub async fn upload_files(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = extract_multipart_files(multipart).await?;

    let accepted = UploadService::new(&state)
        .upload_batch(tenant_ctx.tenant_id, files)
        .await?;

    Ok((StatusCode::CREATED, Json(accepted)))
}
