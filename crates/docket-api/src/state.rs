//! Application state and sub-state extractors.
//!
//! AppState is split into sub-states so handlers can extract only what they
//! need via Axum's `FromRef`.

use docket_core::Config;
use docket_db::{
    AccountRepository, ApiKeyRepository, CorporationRepository, FileRepository,
    PartnerRepository, TaskRepository, TenantRepository, UserRepository,
};
use docket_extraction::ExtractionClient;
use docket_storage::Storage;
use docket_worker::TaskQueue;
use sqlx::PgPool;
use std::sync::Arc;

/// Database pool and the repositories behind the CRUD endpoints.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub api_key_repository: ApiKeyRepository,
    pub tenant_repository: TenantRepository,
    pub account_repository: AccountRepository,
    pub partner_repository: PartnerRepository,
    pub user_repository: UserRepository,
    pub corporation_repository: CorporationRepository,
}

/// Document records, the blob store and upload limits.
#[derive(Clone)]
pub struct FileState {
    pub repository: FileRepository,
    pub storage: Arc<dyn Storage>,
    pub max_upload_size: usize,
    /// Inclusive bounds of the random delay before a new extraction job runs
    pub extraction_delay_secs: (u64, u64),
}

#[derive(Clone)]
pub struct TaskState {
    pub task_queue: TaskQueue,
    pub task_repository: TaskRepository,
}

#[derive(Clone)]
pub struct ExtractionState {
    pub client: Arc<dyn ExtractionClient>,
}

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub files: FileState,
    pub tasks: TaskState,
    pub extraction: ExtractionState,
    pub config: Config,
    pub is_production: bool,
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for FileState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.files.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for TaskState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.tasks.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
