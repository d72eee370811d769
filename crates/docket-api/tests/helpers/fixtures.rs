//! Test fixtures: minimal documents and multipart forms.

use axum_test::multipart::{MultipartForm, Part};

/// A tiny but well-formed single page PDF.
pub fn sample_pdf() -> Vec<u8> {
    let body = "%PDF-1.4\n\
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n\
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] >> endobj\n\
trailer << /Root 1 0 R >>\n\
%%EOF\n";
    body.as_bytes().to_vec()
}

pub fn pdf_part(name: &str, data: Vec<u8>) -> Part {
    Part::bytes(data)
        .file_name(name.to_string())
        .mime_type("application/pdf")
}

/// Multipart form with one PDF per name, all under the `files` field.
pub fn pdf_form(names: &[&str]) -> MultipartForm {
    names
        .iter()
        .fold(MultipartForm::new(), |form, name| {
            form.add_part("files", pdf_part(name, sample_pdf()))
        })
}

/// A well-formed extraction answer for a two-rate invoice.
pub fn invoice_answer() -> String {
    serde_json::json!({
        "issuer_name": "Sakura Trading Co., Ltd.",
        "invoice_date": "2024-03-15T00:00:00Z",
        "registration_number": "T1234567890123",
        "tax_8_base": 1000,
        "tax_8_amount": 80,
        "tax_8_total": 1080,
        "tax_10_base": 2000,
        "tax_10_amount": 200,
        "tax_10_total": 2200,
        "total_amount": 3280
    })
    .to_string()
}
