//! Common utilities for the upload handler

use axum::extract::Multipart;
use docket_core::AppError;

/// Multipart field names that carry documents
const FILE_FIELD_NAMES: [&str; 2] = ["file", "files"];

const MAX_FILENAME_LENGTH: usize = 255;

/// One document received in an upload request, before any validation.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Read every `file`/`files` field of the form, in order. Other fields are
/// ignored.
pub async fn extract_multipart_files(
    mut multipart: Multipart,
) -> Result<Vec<CandidateFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default();
        if !FILE_FIELD_NAMES.contains(&field_name) {
            continue;
        }

        let file_name = display_file_name(field.file_name().unwrap_or_default());
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        files.push(CandidateFile {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    Ok(files)
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Strip MIME parameters and lowercase ("Application/PDF; q=1" -> "application/pdf").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Name shown to users for an uploaded file.
///
/// The name is display-only and never used to build a storage key, so it is
/// kept close to what the client sent: directory components and control
/// characters are dropped and the length is capped.
pub fn display_file_name(raw: &str) -> String {
    let last_component = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = last_component
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILENAME_LENGTH)
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "document.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mime_parameters_and_case() {
        assert_eq!(normalize_mime_type("application/pdf"), "application/pdf");
        assert_eq!(
            normalize_mime_type("Application/PDF; charset=binary"),
            "application/pdf"
        );
        assert_eq!(normalize_mime_type(" image/png "), "image/png");
    }

    #[test]
    fn display_name_keeps_unicode_and_spaces() {
        assert_eq!(display_file_name("請求書 2024-04.pdf"), "請求書 2024-04.pdf");
    }

    #[test]
    fn display_name_drops_directories() {
        assert_eq!(display_file_name("../../etc/passwd"), "passwd");
        assert_eq!(display_file_name("C:\\Users\\a\\invoice.pdf"), "invoice.pdf");
    }

    #[test]
    fn display_name_falls_back_when_empty() {
        assert_eq!(display_file_name(""), "document.pdf");
        assert_eq!(display_file_name("uploads/"), "document.pdf");
        assert_eq!(display_file_name("\u{0007}"), "document.pdf");
    }

    #[test]
    fn size_limit() {
        assert!(validate_file_size(10, 10).is_ok());
        assert!(matches!(
            validate_file_size(11, 10),
            Err(AppError::PayloadTooLarge(_))
        ));
    }
}
