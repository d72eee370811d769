//! Tool parameters, with JSON Schema so the assistant can fill them in

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UploadFilesRequest {
    #[schemars(description = "Local paths of the PDF invoices to upload as one batch")]
    pub file_paths: Vec<String>,
    #[schemars(
        description = "Wait until extraction has finished (or the staleness window has passed) before answering"
    )]
    pub wait: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FileIdRequest {
    #[schemars(description = "UUID of the uploaded file")]
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConfirmFileRequest {
    #[schemars(description = "UUID of the uploaded file")]
    pub file_id: String,
    #[schemars(
        description = "Corrected fields, e.g. {\"total_amount\": \"3280\", \"invoice_date\": \"2024-03-15\"}. Omitted keys keep their value, null clears one"
    )]
    pub fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CorporationRequest {
    #[schemars(
        description = "13 digit corporate number, or the invoice registration number starting with T"
    )]
    pub corporate_number: String,
}
