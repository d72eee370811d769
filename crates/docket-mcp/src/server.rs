//! MCP server using rmcp SDK
//!
//! Exposes the Docket API as MCP tools over stdio.

use crate::tools::*;
use chrono::Utc;
use docket_client::{poll_until_settled, ApiClient, LocalState, PollConfig};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use std::borrow::Cow;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

const INVALID_PARAMS: ErrorCode = ErrorCode(-32602);
const INTERNAL_ERROR: ErrorCode = ErrorCode(-32603);

fn text_content(s: impl Into<String>) -> Content {
    Content {
        raw: RawContent::Text(RawTextContent { text: s.into() }),
        annotations: None,
    }
}

fn tool_error(code: ErrorCode, message: impl ToString) -> ErrorData {
    ErrorData {
        code,
        message: Cow::from(message.to_string()),
        data: None,
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| tool_error(INTERNAL_ERROR, e))?;
    Ok(CallToolResult::success(vec![text_content(text)]))
}

fn parse_file_id(raw: &str) -> Result<Uuid, ErrorData> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| tool_error(INVALID_PARAMS, format!("file_id is not a UUID: {}", raw)))
}

#[derive(Debug, Clone)]
pub struct DocketService {
    api_client: Arc<ApiClient>,
    poll_config: PollConfig,
    tool_router: ToolRouter<DocketService>,
}

#[tool_router]
impl DocketService {
    pub fn new(api_client: ApiClient) -> Self {
        Self::with_poll_config(api_client, PollConfig::from_env())
    }

    pub fn with_poll_config(api_client: ApiClient, poll_config: PollConfig) -> Self {
        Self {
            api_client: Arc::new(api_client),
            poll_config,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Upload local PDF invoices. Field extraction runs in the background; set wait to return once it has settled"
    )]
    async fn upload_files(
        &self,
        Parameters(req): Parameters<UploadFilesRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        if req.file_paths.is_empty() {
            return Err(tool_error(INVALID_PARAMS, "file_paths must not be empty"));
        }
        let paths: Vec<&Path> = req.file_paths.iter().map(Path::new).collect();
        let uploaded = self
            .api_client
            .upload_pdf_paths(&paths)
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;

        if !req.wait.unwrap_or(false) {
            return json_result(&uploaded);
        }

        let initial = LocalState::default()
            .with_uploads(uploaded.iter().map(|f| f.file_name.clone()), Utc::now());
        let settled = poll_until_settled(&self.api_client, initial, &self.poll_config).await;
        let files: Vec<_> = settled
            .files
            .into_iter()
            .filter(|tracked| uploaded.iter().any(|u| u.id == tracked.file.id))
            .map(|tracked| tracked.file)
            .collect();

        json_result(&serde_json::json!({ "uploaded": uploaded, "files": files }))
    }

    #[tool(description = "List the organization's uploaded invoices with status and extracted fields")]
    async fn list_files(&self) -> Result<CallToolResult, ErrorData> {
        let files = self
            .api_client
            .list_files()
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&files)
    }

    #[tool(description = "Get the status and extracted fields of one uploaded invoice")]
    async fn get_file_details(
        &self,
        Parameters(req): Parameters<FileIdRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let id = parse_file_id(&req.file_id)?;
        let file = self
            .api_client
            .get_file(id)
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&file)
    }

    #[tool(description = "Save corrected fields for an invoice and mark it confirmed")]
    async fn confirm_file(
        &self,
        Parameters(req): Parameters<ConfirmFileRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let id = parse_file_id(&req.file_id)?;
        let edit = req
            .fields
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        if !edit.is_object() {
            return Err(tool_error(INVALID_PARAMS, "fields must be a JSON object"));
        }
        let file = self
            .api_client
            .confirm_file(id, &edit)
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&file)
    }

    #[tool(description = "Queue extraction again for an invoice still waiting in 'uploaded'")]
    async fn reprocess_file(
        &self,
        Parameters(req): Parameters<FileIdRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let id = parse_file_id(&req.file_id)?;
        let response = self
            .api_client
            .reprocess_file(id)
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&serde_json::json!({
            "file_id": response.file_id,
            "task_id": response.task_id,
            "already_queued": response.already_queued,
        }))
    }

    #[tool(
        description = "Look a company up in the corporate number and invoice issuer registries"
    )]
    async fn lookup_corporation(
        &self,
        Parameters(req): Parameters<CorporationRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let number = req.corporate_number.trim();
        if number.is_empty() {
            return Err(tool_error(INVALID_PARAMS, "corporate_number must not be empty"));
        }
        let lookup = self
            .api_client
            .lookup_corporation(number)
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&lookup)
    }

    #[tool(description = "List business partners with their bank accounts")]
    async fn list_partners(&self) -> Result<CallToolResult, ErrorData> {
        let partners = self
            .api_client
            .list_partners()
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&partners)
    }

    #[tool(description = "List the organization's own bank accounts")]
    async fn list_accounts(&self) -> Result<CallToolResult, ErrorData> {
        let accounts = self
            .api_client
            .list_accounts()
            .await
            .map_err(|e| tool_error(INTERNAL_ERROR, e))?;
        json_result(&accounts)
    }
}

#[tool_handler]
impl ServerHandler for DocketService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "docket-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Docket MCP: upload PDF invoices, follow and review their extracted fields, \
                 confirm them, and look up partners, accounts and registered corporations. \
                 Set DOCKET_API_KEY and DOCKET_API_URL."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_client::Auth;
    use serde_json::json;
    use std::time::Duration;

    fn service(url: String) -> DocketService {
        let client = ApiClient::new(url, Auth::XApiKey("k".to_string())).unwrap();
        DocketService::with_poll_config(
            client,
            PollConfig {
                interval: Duration::from_millis(20),
                staleness_window: Duration::from_millis(200),
            },
        )
    }

    fn rendered(result: &CallToolResult) -> String {
        serde_json::to_string(result).unwrap()
    }

    fn file_json(id: Uuid, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "file_name": "invoice.pdf",
            "object_key": format!("uploads/{}", id),
            "status": status,
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
            "uploaded_at": Utc::now(),
            "updated_at": Utc::now()
        })
    }

    #[tokio::test]
    async fn file_details_rejects_malformed_id() {
        let svc = service("http://127.0.0.1:9".to_string());
        let err = svc
            .get_file_details(Parameters(FileIdRequest {
                file_id: "not-a-uuid".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, INVALID_PARAMS.0);
    }

    #[tokio::test]
    async fn file_details_returns_server_record() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        server
            .mock("GET", format!("/api/v1/files/{}", id).as_str())
            .match_header("x-api-key", "k")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(file_json(id, "needs_review").to_string())
            .create_async()
            .await;

        let svc = service(server.url());
        let result = svc
            .get_file_details(Parameters(FileIdRequest {
                file_id: id.to_string(),
            }))
            .await
            .unwrap();
        let text = rendered(&result);
        assert!(text.contains(&id.to_string()));
        assert!(text.contains("needs_review"));
    }

    #[tokio::test]
    async fn confirm_requires_an_object() {
        let svc = service("http://127.0.0.1:9".to_string());
        let err = svc
            .confirm_file(Parameters(ConfirmFileRequest {
                file_id: Uuid::new_v4().to_string(),
                fields: Some(json!([1, 2])),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, INVALID_PARAMS.0);
    }

    #[tokio::test]
    async fn api_failure_becomes_internal_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/corporation")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":"No corporation found for 0000000000000"}"#)
            .create_async()
            .await;

        let svc = service(server.url());
        let err = svc
            .lookup_corporation(Parameters(CorporationRequest {
                corporate_number: "0000000000000".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, INTERNAL_ERROR.0);
        assert!(err.message.contains("404"));
    }

    #[tokio::test]
    async fn upload_with_wait_reports_settled_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").unwrap();

        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        server
            .mock("POST", "/api/v1/upload")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(json!([{ "id": id, "file_name": "invoice.pdf" }]).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/files")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([file_json(id, "needs_review")]).to_string())
            .create_async()
            .await;

        let svc = service(server.url());
        let result = svc
            .upload_files(Parameters(UploadFilesRequest {
                file_paths: vec![path.to_string_lossy().into_owned()],
                wait: Some(true),
            }))
            .await
            .unwrap();

        let text = rendered(&result);
        assert!(text.contains("needs_review"));
        assert!(text.contains(&id.to_string()));
    }

    #[test]
    fn server_info_advertises_tools() {
        let info = service("http://127.0.0.1:9".to_string()).get_info();
        assert_eq!(info.server_info.name, "docket-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
