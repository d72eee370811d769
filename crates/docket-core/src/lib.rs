//! Docket core library
//!
//! Domain models, error types and configuration shared by every docket crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod task_error;

pub use config::{AppConfig, BaseConfig, Config, ExtractionConfig, TaskQueueSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use task_error::{TaskError, TaskResultExt};
