//! Database repositories for data access layer
//!
//! Repositories are organized into control/ (tenants, users, API keys) and
//! records/ (files, tasks, accounts, partners, corporate registries).
//
// Identity repositories (tenants, users, API keys)
pub mod control;
//
// Tenant data repositories (files, tasks, accounts, partners) and the
// shared corporate registries
pub mod records;

pub use control::{ApiKeyRepository, TenantRepository, UserInput, UserRepository};
pub use records::{
    AccountRepository, CorporationRepository, FileRepository, PartnerRepository, TaskRepository,
    NEW_TASK_CHANNEL,
};
