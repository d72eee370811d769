//! Task queue: worker pool, LISTEN/NOTIFY or polling, retry, and submission.
//!
//! Tasks are submitted with an optional future `scheduled_at` and become
//! claimable once it passes. [`TaskQueue::shutdown`] signals the pool to stop
//! claiming; in-flight tasks run to completion or timeout.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

use docket_core::models::{Priority, Task, TaskType};
use docket_core::{TaskError, TaskQueueSettings};
use docket_db::{TaskRepository, NEW_TASK_CHANNEL};

use crate::context::TaskHandlerContext;

const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on the delay before a failed task is retried.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    2_u64
        .checked_pow(retry_count.max(0) as u32)
        .unwrap_or(u64::MAX)
        .min(MAX_RETRY_BACKOFF_SECS)
}

#[derive(Debug, Clone)]
pub struct TaskQueueConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub default_timeout_seconds: i32,
    pub max_retries: i32,
    /// Interval in seconds between runs of the stale task reaper (0 disables it).
    pub stale_task_reap_interval_secs: u64,
    /// Grace period in seconds added to task timeout before reaping stale running tasks.
    pub stale_task_grace_period_secs: i64,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval_ms: 1000,
            default_timeout_seconds: 300,
            max_retries: 3,
            stale_task_reap_interval_secs: 60,
            stale_task_grace_period_secs: 300,
        }
    }
}

impl From<&TaskQueueSettings> for TaskQueueConfig {
    fn from(settings: &TaskQueueSettings) -> Self {
        Self {
            max_workers: settings.max_workers,
            poll_interval_ms: settings.poll_interval_ms,
            default_timeout_seconds: settings.timeout_seconds,
            max_retries: settings.max_retries,
            stale_task_reap_interval_secs: settings.stale_task_reap_interval_secs,
            stale_task_grace_period_secs: settings.stale_task_grace_period_secs,
        }
    }
}

/// What to do with a task whose handler returned an error.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FailureAction {
    Retry { backoff_secs: u64 },
    Fail { reason: &'static str },
}

fn failure_action(task: &Task, unrecoverable: bool) -> FailureAction {
    if unrecoverable {
        FailureAction::Fail {
            reason: "Task failed with unrecoverable error",
        }
    } else if task.can_retry() {
        FailureAction::Retry {
            backoff_secs: compute_retry_backoff_seconds(task.retry_count),
        }
    } else {
        FailureAction::Fail {
            reason: "Task failed after maximum retries",
        }
    }
}

fn is_unrecoverable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<TaskError>()
        .map(|te| !te.is_recoverable())
        .unwrap_or(false)
}

/// Forward every NOTIFY on the new-task channel to `wake`. Reconnects after
/// a dropped connection; polling covers the gap.
fn spawn_new_task_listener(pool: sqlx::PgPool, wake: mpsc::Sender<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mut listener = match sqlx::postgres::PgListener::connect_with(&pool).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::warn!(error = %e, "PgListener connect failed, will retry");
                    sleep(LISTENER_RETRY_DELAY).await;
                    continue;
                }
            };
            if let Err(e) = listener.listen(NEW_TASK_CHANNEL).await {
                tracing::warn!(error = %e, channel = NEW_TASK_CHANNEL, "LISTEN failed, will retry");
                sleep(LISTENER_RETRY_DELAY).await;
                continue;
            }
            while listener.recv().await.is_ok() {
                // A full channel already holds a pending wakeup.
                let _ = wake.try_send(());
            }
        }
    })
}

/// Periodically return running tasks that outlived their timeout to the queue.
fn spawn_stale_task_reaper(
    repository: TaskRepository,
    every: Duration,
    grace_period_secs: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = repository.reap_stale_running_tasks(grace_period_secs).await {
                tracing::error!(error = %e, "Stale task reaper failed");
            }
        }
    })
}

#[derive(Clone)]
pub struct TaskQueue {
    repository: TaskRepository,
    config: TaskQueueConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl TaskQueue {
    /// Create a queue handle. Submission works immediately; call
    /// [`TaskQueue::start_workers`] to begin processing.
    pub fn new(repository: TaskRepository, config: TaskQueueConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            repository,
            config,
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &TaskQueueConfig {
        &self.config
    }

    /// Submit a new task to the queue.
    #[tracing::instrument(skip(self, payload))]
    pub async fn submit_task(
        &self,
        tenant_id: Uuid,
        task_type: TaskType,
        payload: serde_json::Value,
        priority: Priority,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid> {
        let task = self
            .repository
            .create_task(
                tenant_id,
                task_type.clone(),
                payload,
                priority.as_i32(),
                scheduled_at,
                Some(self.config.max_retries),
                Some(self.config.default_timeout_seconds),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    tenant_id = %tenant_id,
                    task_type = %task_type,
                    "Failed to create task in repository"
                );
                e
            })?;

        tracing::info!(
            task_id = %task.id,
            task_type = %task_type,
            scheduled_at = %task.scheduled_at,
            "Task submitted to queue"
        );

        Ok(task.id)
    }

    /// Spawn the worker pool.
    ///
    /// If `pool` is `Some`, the worker LISTENs on the new-task channel to wake
    /// immediately, in addition to polling at `poll_interval_ms`.
    pub fn start_workers(
        &self,
        context: Weak<dyn TaskHandlerContext>,
        pool: Option<sqlx::PgPool>,
    ) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let config = self.config.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            Self::worker_pool(repository, config, context, shutdown_rx, pool).await;
        })
    }

    async fn worker_pool(
        repository: TaskRepository,
        config: TaskQueueConfig,
        context: Weak<dyn TaskHandlerContext>,
        mut shutdown_rx: watch::Receiver<bool>,
        pool: Option<sqlx::PgPool>,
    ) {
        let use_listen = pool.is_some();
        tracing::info!(
            max_workers = config.max_workers,
            poll_interval_ms = config.poll_interval_ms,
            listen_notify = use_listen,
            "Task queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        let (notify_tx, mut notify_rx) = mpsc::channel::<()>(16);
        let listener_handle = pool.map(|pool| spawn_new_task_listener(pool, notify_tx));
        let reaper_handle = (config.stale_task_reap_interval_secs > 0).then(|| {
            spawn_stale_task_reaper(
                repository.clone(),
                Duration::from_secs(config.stale_task_reap_interval_secs),
                config.stale_task_grace_period_secs,
            )
        });

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Task queue worker pool shutting down");
                        break;
                    }
                }
                _ = notify_rx.recv() => {
                    Self::claim_and_dispatch_one(&repository, &semaphore, &context).await;
                }
                _ = sleep(poll_interval) => {
                    Self::claim_and_dispatch_one(&repository, &semaphore, &context).await;
                }
            }
        }

        if let Some(handle) = listener_handle {
            handle.abort();
        }
        if let Some(handle) = reaper_handle {
            handle.abort();
        }

        tracing::info!("Task queue worker pool stopped");
    }

    async fn claim_and_dispatch_one(
        repository: &TaskRepository,
        semaphore: &Arc<Semaphore>,
        context: &Weak<dyn TaskHandlerContext>,
    ) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("No workers available, skipping claim");
                return;
            }
        };

        match repository.claim_next_task().await {
            Ok(Some(task)) => {
                let repo = repository.clone();
                let ctx = context.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = Self::process_task(task, repo, ctx).await {
                        tracing::error!(error = %e, "Task processing failed");
                    }
                });
            }
            Ok(None) => {
                tracing::trace!("No tasks available in queue");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim task from queue");
            }
        }
    }

    #[tracing::instrument(skip(repository, context), fields(task.id = %task.id, task.type = %task.task_type))]
    async fn process_task(
        task: Task,
        repository: TaskRepository,
        context: Weak<dyn TaskHandlerContext>,
    ) -> Result<()> {
        let ctx = context.upgrade().ok_or_else(|| {
            anyhow::anyhow!("TaskHandlerContext was dropped, cannot process task")
        })?;

        let timeout_duration = task
            .timeout_seconds
            .map(|s| Duration::from_secs(s.max(1) as u64))
            .unwrap_or(Duration::from_secs(3600));

        let start = std::time::Instant::now();
        let result = tokio::time::timeout(timeout_duration, ctx.dispatch_task(&task)).await;

        let error = match result {
            Ok(Ok(task_result)) => {
                repository
                    .mark_completed(task.id, task_result)
                    .await
                    .context("Failed to mark task as completed")?;
                tracing::info!(
                    task_id = %task.id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Task completed successfully"
                );
                return Ok(());
            }
            Ok(Err(e)) => e,
            Err(_) => anyhow::anyhow!(
                "Task execution timed out after {}s",
                timeout_duration.as_secs()
            ),
        };

        let unrecoverable = is_unrecoverable(&error);
        tracing::warn!(
            task_id = %task.id,
            error = %error,
            retry_count = task.retry_count,
            max_retries = task.max_retries,
            unrecoverable = unrecoverable,
            "Task execution failed"
        );

        match failure_action(&task, unrecoverable) {
            FailureAction::Retry { backoff_secs } => {
                let retry_at = Utc::now() + chrono::Duration::seconds(backoff_secs as i64);
                repository.schedule_retry(task.id, retry_at).await?;
                Ok(())
            }
            FailureAction::Fail { reason } => {
                let error_result = json!({
                    "error": error.to_string(),
                    "retry_count": task.retry_count,
                    "unrecoverable": unrecoverable,
                    "reason": reason,
                });
                repository
                    .mark_failed(task.id, error_result)
                    .await
                    .context("Failed to mark task as failed")?;
                tracing::error!(
                    task_id = %task.id,
                    tenant_id = %task.tenant_id,
                    payload = %task.payload,
                    reason = reason,
                    "Task abandoned"
                );
                Err(error)
            }
        }
    }

    /// Signals the worker pool to stop claiming new tasks and exit its loop.
    pub fn shutdown(&self) {
        tracing::info!("Initiating task queue shutdown");
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::models::{ExtractFileFieldsPayload, TaskStatus};

    fn task(retry_count: i32, max_retries: i32) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            task_type: TaskType::ExtractFileFields,
            status: TaskStatus::Running,
            priority: Priority::Normal.as_i32(),
            payload: Task::payload_from(&ExtractFileFieldsPayload {
                file_id: Uuid::new_v4(),
            })
            .unwrap(),
            result: None,
            scheduled_at: now,
            started_at: Some(now),
            completed_at: None,
            retry_count,
            max_retries,
            timeout_seconds: Some(300),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn retry_backoff_exponential_then_capped() {
        assert_eq!(compute_retry_backoff_seconds(0), 1);
        assert_eq!(compute_retry_backoff_seconds(1), 2);
        assert_eq!(compute_retry_backoff_seconds(2), 4);
        assert_eq!(compute_retry_backoff_seconds(8), 256);
        assert_eq!(compute_retry_backoff_seconds(9), MAX_RETRY_BACKOFF_SECS);
        assert_eq!(compute_retry_backoff_seconds(70), MAX_RETRY_BACKOFF_SECS);
    }

    #[test]
    fn unrecoverable_task_error_detected() {
        let err: anyhow::Error = TaskError::unrecoverable(anyhow::anyhow!("bad config")).into();
        assert!(is_unrecoverable(&err));
    }

    #[test]
    fn recoverable_task_error_detected() {
        let err: anyhow::Error = TaskError::recoverable(anyhow::anyhow!("network")).into();
        assert!(!is_unrecoverable(&err));
    }

    #[test]
    fn record_not_found_is_not_retried() {
        let err: anyhow::Error =
            TaskError::from(docket_core::AppError::RecordNotFound("gone".into())).into();
        assert!(is_unrecoverable(&err));
        assert!(matches!(
            failure_action(&task(0, 3), true),
            FailureAction::Fail { .. }
        ));
    }

    #[test]
    fn non_task_error_treated_as_recoverable() {
        let err: anyhow::Error = anyhow::anyhow!("generic error");
        assert!(!is_unrecoverable(&err));
    }

    #[test]
    fn recoverable_failures_retry_until_budget_is_spent() {
        assert_eq!(
            failure_action(&task(0, 3), false),
            FailureAction::Retry { backoff_secs: 1 }
        );
        assert_eq!(
            failure_action(&task(2, 3), false),
            FailureAction::Retry { backoff_secs: 4 }
        );
        assert_eq!(
            failure_action(&task(3, 3), false),
            FailureAction::Fail {
                reason: "Task failed after maximum retries"
            }
        );
    }

    #[test]
    fn config_follows_settings() {
        let settings = TaskQueueSettings {
            max_workers: 2,
            poll_interval_ms: 250,
            max_retries: 5,
            timeout_seconds: 60,
            stale_task_reap_interval_secs: 0,
            stale_task_grace_period_secs: 30,
        };
        let config = TaskQueueConfig::from(&settings);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.default_timeout_seconds, 60);
        assert_eq!(config.stale_task_reap_interval_secs, 0);
    }
}
