use thiserror::Error;

use docket_core::AppError;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction service is not configured: {0}")]
    NotConfigured(String),

    #[error("Extraction request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Extraction service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Extraction service response was malformed: {0}")]
    MalformedResponse(String),
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::ExtractionServiceError(err.to_string())
    }
}
