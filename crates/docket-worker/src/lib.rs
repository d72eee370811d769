//! Docket Worker – delayed background task queue and worker infrastructure.
//!
//! This crate provides the task queue (submission with a future `scheduled_at`,
//! LISTEN/NOTIFY wakeups plus polling, retry with backoff, stale task reaping)
//! and the `TaskHandlerContext` trait. The API implements the trait for its
//! application state and dispatches to handlers; handlers remain in the API crate.

mod context;
mod queue;

pub use context::TaskHandlerContext;
pub use queue::{compute_retry_backoff_seconds, TaskQueue, TaskQueueConfig, MAX_RETRY_BACKOFF_SECS};
