//! Docket API Library
//!
//! HTTP handlers, authentication, the upload coordinator, the extraction task
//! handler and application setup.

mod api_doc;
pub mod constants;
pub mod handlers;
pub mod services;
pub mod setup;
mod task_dispatch;
pub mod task_handlers;
mod telemetry;
pub mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use docket_worker::{TaskQueue, TaskQueueConfig};
pub use task_handlers::TaskHandler;
