use crate::state::AppState;
use anyhow::Result;
use async_trait::async_trait;
use docket_core::constants::PDF_CONTENT_TYPE;
use docket_core::models::{ExtractFileFieldsPayload, Task, TaskType};
use docket_core::{AppError, TaskError};
use docket_extraction::{parse_extraction, ParseOutcome};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Runs field extraction for one uploaded document:
/// load record → fetch blob → call the model → parse → guarded update.
#[derive(Clone, Default)]
pub struct ExtractionTaskHandler;

fn fail(err: AppError) -> anyhow::Error {
    anyhow::Error::new(TaskError::from(err))
}

#[async_trait]
impl crate::task_handlers::TaskHandler for ExtractionTaskHandler {
    async fn process(&self, task: &Task, state: Arc<AppState>) -> Result<serde_json::Value> {
        if task.task_type != TaskType::ExtractFileFields {
            return Err(anyhow::Error::new(TaskError::unrecoverable(anyhow::anyhow!(
                "Invalid task type for extraction handler"
            ))));
        }

        let payload: ExtractFileFieldsPayload = task
            .try_payload_as()
            .map_err(|e| anyhow::Error::new(TaskError::unrecoverable(e)))?;
        let file_id = payload.file_id;

        let record = state
            .files
            .repository
            .get_by_id(file_id)
            .await
            .map_err(fail)?
            .ok_or_else(|| fail(AppError::RecordNotFound(file_id.to_string())))?;

        if !record.status.is_pending_extraction() {
            tracing::info!(
                file_id = %file_id,
                status = %record.status,
                "Record already past extraction, skipping"
            );
            return Ok(json!({
                "file_id": file_id,
                "status": "skipped",
                "record_status": record.status,
            }));
        }

        let document = state
            .files
            .storage
            .get(&record.object_key)
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    file_id = %file_id,
                    object_key = %record.object_key,
                    "Blob not readable"
                );
                fail(AppError::BlobUnavailable(record.object_key.clone()))
            })?;

        let mime_type = match state.files.storage.content_type(&record.object_key).await {
            Ok(Some(ct)) => ct,
            _ => PDF_CONTENT_TYPE.to_string(),
        };

        let client = &state.extraction.client;
        tracing::info!(
            file_id = %file_id,
            size_bytes = document.len(),
            client = client.name(),
            "Requesting field extraction"
        );

        let answer = client
            .extract(&document, &mime_type)
            .await
            .map_err(|e| fail(AppError::from(e)))?;

        let outcome = parse_extraction(&answer);
        if let Some(reason) = &outcome.failure {
            tracing::warn!(
                file_id = %file_id,
                reason = %reason,
                "Model answer unreadable, storing empty fields"
            );
        }

        let applied = state
            .files
            .repository
            .apply_extraction(file_id, &outcome.fields)
            .await
            .map_err(fail)?;

        if applied {
            tracing::info!(
                file_id = %file_id,
                populated = outcome.fields.populated_count(),
                "Extraction stored, record needs review"
            );
        } else {
            tracing::info!(
                file_id = %file_id,
                "Record changed while extracting, result discarded"
            );
        }

        Ok(extraction_summary(file_id, &outcome, applied))
    }
}

fn extraction_summary(file_id: Uuid, outcome: &ParseOutcome, applied: bool) -> serde_json::Value {
    json!({
        "file_id": file_id,
        "status": if applied { "extracted" } else { "discarded" },
        "populated_fields": outcome.fields.populated_count(),
        "parse_failure": outcome.failure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_parse_failure() {
        let id = Uuid::new_v4();
        let outcome = parse_extraction("not json");
        let summary = extraction_summary(id, &outcome, true);

        assert_eq!(summary["status"], "extracted");
        assert_eq!(summary["populated_fields"], 0);
        assert!(summary["parse_failure"].is_string());
        assert_eq!(summary["file_id"], json!(id));
    }

    #[test]
    fn summary_for_discarded_result() {
        let outcome = parse_extraction(r#"{"issuer_name": "Acme", "total_amount": 1100}"#);
        let summary = extraction_summary(Uuid::nil(), &outcome, false);

        assert_eq!(summary["status"], "discarded");
        assert_eq!(summary["populated_fields"], 2);
        assert!(summary["parse_failure"].is_null());
    }

    #[test]
    fn missing_record_is_not_retried() {
        let err = fail(AppError::RecordNotFound("x".to_string()));
        let task_err = err.downcast_ref::<TaskError>().unwrap();
        assert!(!task_err.is_recoverable());
    }

    #[test]
    fn unreadable_blob_is_retried() {
        let err = fail(AppError::BlobUnavailable("uploads/x".to_string()));
        assert!(err.downcast_ref::<TaskError>().unwrap().is_recoverable());
    }
}
