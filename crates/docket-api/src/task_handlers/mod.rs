use crate::state::AppState;
use anyhow::Result;
use async_trait::async_trait;
use docket_core::models::Task;
use std::sync::Arc;

mod extraction;

pub use extraction::ExtractionTaskHandler;

/// Executes one kind of queued task against the application state.
#[async_trait]
pub trait TaskHandler {
    async fn process(&self, task: &Task, state: Arc<AppState>) -> Result<serde_json::Value>;
}
