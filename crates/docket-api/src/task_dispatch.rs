//! Routes claimed tasks to their handlers.

use anyhow::Result;
use async_trait::async_trait;
use docket_core::models::{Task, TaskType};
use docket_worker::TaskHandlerContext;
use std::sync::Arc;

use crate::state::AppState;
use crate::task_handlers::{ExtractionTaskHandler, TaskHandler};

#[async_trait]
impl TaskHandlerContext for AppState {
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value> {
        match task.task_type {
            TaskType::ExtractFileFields => ExtractionTaskHandler.process(task, self).await,
        }
    }
}
