//! Upload coordinator
//!
//! Accepts a batch of documents for one tenant and, for each file in order:
//! store blob → insert record → enqueue a delayed extraction job. The whole
//! batch is validated before the first write, so a bad file rejects the
//! request with nothing stored.

use chrono::{Duration, Utc};
use docket_core::constants::PDF_CONTENT_TYPE;
use docket_core::models::{
    ExtractFileFieldsPayload, FileRecord, FileSummary, Priority, Task, TaskPayload,
};
use docket_core::AppError;
use docket_storage::generate_object_key;
use rand::Rng;
use uuid::Uuid;

use crate::state::{AppState, FileState, TaskState};
use crate::utils::upload::{normalize_mime_type, validate_file_size, CandidateFile};

/// Check every file in the batch. Fails on the first file that is not a PDF
/// or is too large; an empty batch is rejected too.
pub fn validate_batch(files: &[CandidateFile], max_size: usize) -> Result<(), AppError> {
    if files.is_empty() {
        return Err(AppError::InvalidInput(
            "No file provided; send one or more fields named 'file' or 'files'".to_string(),
        ));
    }

    for file in files {
        let mime = normalize_mime_type(&file.content_type);
        if mime != PDF_CONTENT_TYPE {
            return Err(AppError::InvalidFileType(format!(
                "{} is not a PDF ({})",
                file.file_name, mime
            )));
        }
        if file.data.is_empty() {
            return Err(AppError::InvalidInput(format!("{} is empty", file.file_name)));
        }
        validate_file_size(file.data.len(), max_size)?;
    }

    Ok(())
}

/// Seconds to hold a new extraction job back, drawn uniformly from the
/// inclusive range.
pub fn pick_extraction_delay(range: (u64, u64)) -> u64 {
    let (min, max) = range;
    if min >= max {
        return min;
    }
    rand::rng().random_range(min..=max)
}

pub struct UploadService<'a> {
    files: &'a FileState,
    tasks: &'a TaskState,
}

impl<'a> UploadService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            files: &state.files,
            tasks: &state.tasks,
        }
    }

    /// Store, record and enqueue every file in the batch.
    ///
    /// Files are handled one at a time. If one fails part way, its blob (and
    /// record, if already inserted) is removed in the background and the error
    /// is returned; files earlier in the batch are complete and are kept.
    #[tracing::instrument(skip(self, files), fields(tenant_id = %tenant_id, file_count = files.len()))]
    pub async fn upload_batch(
        &self,
        tenant_id: Uuid,
        files: Vec<CandidateFile>,
    ) -> Result<Vec<FileSummary>, AppError> {
        validate_batch(&files, self.files.max_upload_size)?;

        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            let record = self.upload_one(tenant_id, file).await?;
            accepted.push(FileSummary {
                id: record.id,
                file_name: record.file_name,
            });
        }

        tracing::info!(accepted = accepted.len(), "Upload batch stored");
        Ok(accepted)
    }

    async fn upload_one(&self, tenant_id: Uuid, file: CandidateFile) -> Result<FileRecord, AppError> {
        let object_key = generate_object_key();
        let size = file.data.len();
        let content_type = normalize_mime_type(&file.content_type);

        self.files
            .storage
            .put(&object_key, &content_type, file.data)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, object_key = %object_key, "Failed to store document");
                AppError::Storage(e.to_string())
            })?;

        let record = match self
            .files
            .repository
            .create(tenant_id, &file.file_name, &object_key)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                self.discard(tenant_id, &object_key, None);
                return Err(e);
            }
        };

        let delay_secs = pick_extraction_delay(self.files.extraction_delay_secs);
        if let Err(e) = self.enqueue_extraction(tenant_id, record.id, delay_secs).await {
            tracing::error!(error = %e, file_id = %record.id, "Failed to enqueue extraction");
            self.discard(tenant_id, &object_key, Some(record.id));
            return Err(e);
        }

        tracing::info!(
            file_id = %record.id,
            object_key = %object_key,
            size_bytes = size,
            delay_secs,
            "Document uploaded and extraction scheduled"
        );
        Ok(record)
    }

    async fn enqueue_extraction(
        &self,
        tenant_id: Uuid,
        file_id: Uuid,
        delay_secs: u64,
    ) -> Result<Uuid, AppError> {
        let payload = Task::payload_from(&ExtractFileFieldsPayload { file_id })?;
        let scheduled_at = Utc::now() + Duration::seconds(delay_secs as i64);

        let task_id = self
            .tasks
            .task_queue
            .submit_task(
                tenant_id,
                ExtractFileFieldsPayload::task_type(),
                payload,
                Priority::Normal,
                Some(scheduled_at),
            )
            .await?;
        Ok(task_id)
    }

    /// Best-effort removal of a partially uploaded file.
    fn discard(&self, tenant_id: Uuid, object_key: &str, file_id: Option<Uuid>) {
        let storage = self.files.storage.clone();
        let repository = self.files.repository.clone();
        let object_key = object_key.to_string();

        tokio::spawn(async move {
            if let Some(file_id) = file_id {
                if let Err(e) = repository.delete(tenant_id, file_id).await {
                    tracing::warn!(error = %e, file_id = %file_id, "Failed to remove orphaned file record");
                }
            }
            if let Err(e) = storage.delete(&object_key).await {
                tracing::warn!(error = %e, object_key = %object_key, "Failed to remove orphaned blob");
            }
        });
    }
}
