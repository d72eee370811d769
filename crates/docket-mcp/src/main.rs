//! Docket MCP Server
//!
//! Run with: DOCKET_API_KEY=xxx DOCKET_API_URL=xxx docket-mcp

use anyhow::Context;
use docket_mcp::{ApiClient, DocketService};
use rmcp::service::ServiceExt;
use rmcp::transport::io::stdio;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let api_client = ApiClient::from_env().context(
        "Failed to create API client. Set DOCKET_API_KEY and DOCKET_API_URL environment variables",
    )?;
    tracing::info!(base_url = %api_client.base_url(), "Starting Docket MCP server on stdio");

    let service = DocketService::new(api_client);
    let running = service.serve(stdio()).await.context("MCP transport failed")?;
    running.waiting().await.context("MCP server error")?;

    Ok(())
}
