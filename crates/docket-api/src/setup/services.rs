//! Service initialization and application state setup

use crate::state::{AppState, DbState, ExtractionState, FileState, TaskState};
use anyhow::{Context, Result};
use docket_core::Config;
use docket_db::{
    AccountRepository, ApiKeyRepository, CorporationRepository, FileRepository,
    PartnerRepository, TaskRepository, TenantRepository, UserRepository,
};
use docket_extraction::{ExtractionClient, GeminiClient};
use docket_storage::Storage;
use docket_worker::{TaskHandlerContext, TaskQueue, TaskQueueConfig};
use sqlx::PgPool;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

/// Build the application state and start the extraction workers.
pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let extraction_client = GeminiClient::from_config(config.extraction())
        .context("Failed to initialize extraction client")?;
    tracing::info!(
        model = %config.extraction().gemini_model,
        "Extraction client initialized"
    );

    let state = build_state(config, pool, storage, Arc::new(extraction_client));

    start_task_workers(&state);

    Ok(state)
}

/// Assemble [`AppState`] from already-connected collaborators. Workers are
/// not started.
pub fn build_state(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
    extraction_client: Arc<dyn ExtractionClient>,
) -> Arc<AppState> {
    let task_repository = TaskRepository::new(pool.clone());
    let task_queue_config = TaskQueueConfig::from(config.task_queue());
    let task_queue = TaskQueue::new(task_repository.clone(), task_queue_config);

    let db = DbState {
        pool: pool.clone(),
        api_key_repository: ApiKeyRepository::new(pool.clone()),
        tenant_repository: TenantRepository::new(pool.clone()),
        account_repository: AccountRepository::new(pool.clone()),
        partner_repository: PartnerRepository::new(pool.clone()),
        user_repository: UserRepository::new(pool.clone()),
        corporation_repository: CorporationRepository::new(pool.clone()),
    };

    let files = FileState {
        repository: FileRepository::new(pool),
        storage,
        max_upload_size: config.max_upload_size_bytes(),
        extraction_delay_secs: config.extraction_delay_range(),
    };

    Arc::new(AppState {
        db,
        files,
        tasks: TaskState {
            task_queue,
            task_repository,
        },
        extraction: ExtractionState {
            client: extraction_client,
        },
        config: config.clone(),
        is_production: config.is_production(),
    })
}

/// Start the worker pool against `state`.
///
/// Workers hold only a weak reference; once the last `Arc<AppState>` is
/// dropped, claimed tasks fail and are picked up again after a restart.
pub fn start_task_workers(state: &Arc<AppState>) -> JoinHandle<()> {
    let context: Arc<dyn TaskHandlerContext> = state.clone();
    let weak: Weak<dyn TaskHandlerContext> = Arc::downgrade(&context);

    let task_queue = &state.tasks.task_queue;
    let handle = task_queue.start_workers(weak, Some(state.db.pool.clone()));

    tracing::info!(
        max_workers = task_queue.config().max_workers,
        poll_interval_ms = task_queue.config().poll_interval_ms,
        "Task queue workers started"
    );
    handle
}
