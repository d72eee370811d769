//! Docket Database Layer
//!
//! Postgres repositories for the persistent record store and the task queue.
//! Every tenant-facing query takes an explicit `tenant_id`.

pub mod db;

pub use db::{
    AccountRepository, ApiKeyRepository, CorporationRepository, FileRepository,
    PartnerRepository, TaskRepository, TenantRepository, UserInput, UserRepository,
    NEW_TASK_CHANNEL,
};
