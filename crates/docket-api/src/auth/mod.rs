//! Authentication: API key middleware and the tenant context it produces.

pub mod api_key;
pub mod middleware;
pub mod models;

pub use models::TenantContext;
