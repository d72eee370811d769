//! Domain methods for the Docket API client.
//!
//! Response types come from `docket_core::models` where the server shares
//! them. The two handler-local shapes are mirrored here.

use crate::{api_prefix, ApiClient};
use anyhow::{Context, Result};
use docket_core::models::{
    Account, CorporationLookup, CreateAccountRequest, CreatePartnerRequest, FileResponse,
    FileSummary, PartnerResponse, User, UserRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Component, Path};
use uuid::Uuid;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Answer of `POST /files/{id}/reprocess`
#[derive(Debug, Clone, Deserialize)]
pub struct ReprocessResponse {
    pub file_id: Uuid,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub already_queued: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

impl ApiClient {
    /// Upload in-memory PDFs as one batch. Returns one summary per file, in
    /// order.
    pub async fn upload_pdfs(&self, documents: Vec<(String, Vec<u8>)>) -> Result<Vec<FileSummary>> {
        let mut form = reqwest::multipart::Form::new();
        for (file_name, data) in documents {
            let part = reqwest::multipart::Part::bytes(data)
                .file_name(file_name)
                .mime_str(PDF_CONTENT_TYPE)
                .context("Failed to build multipart part")?;
            form = form.part("files", part);
        }

        self.post_multipart(&format!("{}/upload", api_prefix()), form)
            .await
    }

    /// Read PDFs from disk and upload them as one batch.
    pub async fn upload_pdf_paths(&self, paths: &[&Path]) -> Result<Vec<FileSummary>> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            if path.components().any(|c| c == Component::ParentDir) {
                return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
            }
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("invoice.pdf")
                .to_string();
            documents.push((file_name, data));
        }

        self.upload_pdfs(documents).await
    }

    pub async fn list_files(&self) -> Result<Vec<FileResponse>> {
        self.get(&format!("{}/files", api_prefix())).await
    }

    pub async fn get_file(&self, id: Uuid) -> Result<FileResponse> {
        self.get(&format!("{}/files/{}", api_prefix(), id)).await
    }

    /// Save reviewed values and confirm the record. Keys left out of `edit`
    /// keep their stored value; `null` clears one.
    pub async fn confirm_file(&self, id: Uuid, edit: &Value) -> Result<FileResponse> {
        self.put_json(&format!("{}/files/{}", api_prefix(), id), edit)
            .await
    }

    pub async fn reprocess_file(&self, id: Uuid) -> Result<ReprocessResponse> {
        self.post_empty(&format!("{}/files/{}/reprocess", api_prefix(), id))
            .await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.get(&format!("{}/accounts", api_prefix())).await
    }

    pub async fn create_account(&self, request: &CreateAccountRequest) -> Result<Account> {
        self.post_json(&format!("{}/accounts", api_prefix()), request)
            .await
    }

    pub async fn list_partners(&self) -> Result<Vec<PartnerResponse>> {
        self.get(&format!("{}/partners", api_prefix())).await
    }

    pub async fn create_partner(&self, request: &CreatePartnerRequest) -> Result<PartnerResponse> {
        self.post_json(&format!("{}/partners", api_prefix()), request)
            .await
    }

    /// Both corporate registry entries for a 13 digit corporate number.
    pub async fn lookup_corporation(&self, corporate_number: &str) -> Result<CorporationLookup> {
        self.get_query(
            &format!("{}/corporation", api_prefix()),
            &[("corporateNumber", corporate_number)],
        )
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get(&format!("{}/users", api_prefix())).await
    }

    pub async fn create_user(&self, request: &UserRequest) -> Result<User> {
        self.post_json(&format!("{}/users", api_prefix()), request)
            .await
    }

    pub async fn update_user(&self, id: Uuid, request: &UserRequest) -> Result<User> {
        self.put_json(&format!("{}/users/{}", api_prefix(), id), request)
            .await
    }

    pub async fn bulk_delete_users(&self, ids: &[Uuid]) -> Result<BulkDeleteResponse> {
        self.post_json(
            &format!("{}/users/bulk-delete", api_prefix()),
            &json!({ "ids": ids }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use mockito::Matcher;

    fn file_json(id: Uuid, status: &str) -> Value {
        json!({
            "id": id,
            "file_name": "invoice.pdf",
            "object_key": format!("uploads/{}", id),
            "status": status,
            "issuer_name": "Sakura Trading Co., Ltd.",
            "invoice_date": null,
            "registration_number": null,
            "tax_8_base": null,
            "tax_8_amount": null,
            "tax_8_total": null,
            "tax_10_base": "2000",
            "tax_10_amount": "200",
            "tax_10_total": "2200",
            "total_amount": "2200",
            "uploaded_at": "2024-03-15T09:00:00Z",
            "updated_at": "2024-03-15T09:00:12Z"
        })
    }

    #[tokio::test]
    async fn list_files_sends_bearer_key_and_decodes_fields() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("GET", "/api/v1/files")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([file_json(id, "needs_review")]).to_string())
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("secret".to_string())).unwrap();
        let files = client.list_files().await.unwrap();

        mock.assert_async().await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, id);
        assert_eq!(
            files[0].fields.total_amount,
            Some(rust_decimal::Decimal::from(2200))
        );
        assert!(files[0].fields.invoice_date.is_none());
    }

    #[tokio::test]
    async fn record_waiting_for_extraction_decodes_with_null_fields() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let body = json!([{
            "id": id,
            "file_name": "invoice.pdf",
            "object_key": format!("uploads/{}", id),
            "status": "uploaded",
            "issuer_name": null,
            "invoice_date": null,
            "registration_number": null,
            "tax_8_base": null,
            "tax_8_amount": null,
            "tax_8_total": null,
            "tax_10_base": null,
            "tax_10_amount": null,
            "tax_10_total": null,
            "total_amount": null,
            "uploaded_at": "2024-03-15T09:00:00Z",
            "updated_at": "2024-03-15T09:00:00Z"
        }]);
        server
            .mock("GET", "/api/v1/files")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let files = client.list_files().await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].status, docket_core::models::FileStatus::Uploaded);
        assert!(files[0].fields.is_empty());
    }

    #[tokio::test]
    async fn api_key_header_is_used_for_x_api_key_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/users")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::XApiKey("secret".to_string())).unwrap();
        assert!(client.list_users().await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_carries_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/users/bulk-delete")
            .match_body(Matcher::PartialJson(json!({ "ids": [] })))
            .with_status(400)
            .with_body(r#"{"error":"No user ids given for deletion"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let err = client.bulk_delete_users(&[]).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("400"), "{}", message);
        assert!(message.contains("No user ids"), "{}", message);
    }

    #[tokio::test]
    async fn reprocess_without_task_id_decodes() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        server
            .mock("POST", format!("/api/v1/files/{}/reprocess", id).as_str())
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(json!({ "file_id": id, "already_queued": true }).to_string())
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let response = client.reprocess_file(id).await.unwrap();
        assert!(response.already_queued);
        assert!(response.task_id.is_none());
    }

    #[tokio::test]
    async fn confirm_sends_partial_edit_as_put() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("PUT", format!("/api/v1/files/{}", id).as_str())
            .match_body(Matcher::Json(json!({ "total_amount": "3,280", "invoice_date": null })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(file_json(id, "confirmed").to_string())
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let file = client
            .confirm_file(id, &json!({ "total_amount": "3,280", "invoice_date": null }))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(file.status, docket_core::models::FileStatus::Confirmed);
    }

    #[tokio::test]
    async fn corporation_lookup_sends_number_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/corporation")
            .match_query(Matcher::UrlEncoded(
                "corporateNumber".into(),
                "1234567890123".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "corporate_invoice_info": null,
                    "corporate_number_info": {
                        "sequence_number": 1,
                        "corporate_number": "1234567890123",
                        "process": 1,
                        "correct": 0,
                        "update_date": "2024-05-30",
                        "change_date": null,
                        "name": "Sakura Trading KK",
                        "kind": 301,
                        "assignment_date": "2015-10-05",
                        "latest": 1,
                        "hihyoji": 0
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Auth::Bearer("k".to_string())).unwrap();
        let lookup = client.lookup_corporation("1234567890123").await.unwrap();

        mock.assert_async().await;
        assert!(lookup.corporate_invoice_info.is_none());
        let info = lookup.corporate_number_info.unwrap();
        assert_eq!(info.name, "Sakura Trading KK");
        assert!(info.prefecture_name.is_none());
    }

    #[tokio::test]
    async fn upload_rejects_parent_dir_paths() {
        let client =
            ApiClient::new("http://127.0.0.1:9".to_string(), Auth::Bearer("k".to_string())).unwrap();
        let err = client
            .upload_pdf_paths(&[Path::new("../secret.pdf")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid input"));
    }
}
