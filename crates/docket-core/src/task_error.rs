//! Task execution error types
//!
//! A background task reports failure as a [`TaskError`], which carries whether
//! the queue should retry it. Pipeline failures expressed as [`AppError`]
//! convert using the variant's own recoverability, so `RecordNotFound` fails a
//! job permanently while `BlobUnavailable` is retried.

use std::fmt;

use crate::error::{AppError, ErrorMetadata};

#[derive(Debug)]
pub struct TaskError {
    inner: anyhow::Error,
    recoverable: bool,
}

impl TaskError {
    /// The task fails immediately without consuming retries.
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: false,
        }
    }

    /// The task is retried according to the queue's backoff policy.
    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: true,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for TaskError {
    /// Untyped failures are retried
    fn from(err: anyhow::Error) -> Self {
        Self::recoverable(err)
    }
}

impl From<AppError> for TaskError {
    fn from(err: AppError) -> Self {
        let recoverable = err.is_recoverable();
        Self {
            inner: anyhow::Error::new(err),
            recoverable,
        }
    }
}

/// Extension trait for Result to mark errors as permanent
pub trait TaskResultExt<T> {
    fn unrecoverable(self) -> Result<T, TaskError>;
}

impl<T, E: Into<anyhow::Error>> TaskResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, TaskError> {
        self.map_err(|e| TaskError::unrecoverable(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecoverable_error() {
        let err = TaskError::unrecoverable(anyhow::anyhow!("Missing API key"));
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Missing API key"));
    }

    #[test]
    fn test_from_anyhow_defaults_to_recoverable() {
        let err: TaskError = anyhow::anyhow!("connection reset").into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_record_not_found_is_permanent() {
        let err: TaskError = AppError::RecordNotFound("file 42".to_string()).into();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("file 42"));
    }

    #[test]
    fn test_blob_and_extraction_failures_retry() {
        let blob: TaskError = AppError::BlobUnavailable("uploads/x".to_string()).into();
        let llm: TaskError = AppError::ExtractionServiceError("503".to_string()).into();
        assert!(blob.is_recoverable());
        assert!(llm.is_recoverable());
    }

    #[test]
    fn test_app_error_survives_downcast() {
        let err: TaskError = AppError::RecordNotFound("gone".to_string()).into();
        let inner = err.into_inner();
        assert!(matches!(
            inner.downcast_ref::<AppError>(),
            Some(AppError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("Config error"));
        let task_result = result.unrecoverable();
        assert!(!task_result.unwrap_err().is_recoverable());
    }
}
