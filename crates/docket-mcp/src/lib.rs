//! Docket MCP Server
//!
//! Model Context Protocol server that lets an AI assistant upload invoices,
//! follow their extraction, review the result and look up counterparties
//! through the Docket API.

pub mod server;
pub mod tools;

pub use docket_client::ApiClient;
pub use server::DocketService;
