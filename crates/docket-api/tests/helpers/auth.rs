//! Authentication helpers: the master key and per-tenant API keys.

use docket_api::auth::api_key::{extract_key_prefix, generate_api_key, hash_api_key};
use docket_api::state::AppState;
use uuid::Uuid;

/// Master key configured for every test app (at least 32 characters).
pub const TEST_MASTER_API_KEY: &str = "test-master-api-key-at-least-32-characters-long";

pub fn master_bearer() -> String {
    format!("Bearer {}", TEST_MASTER_API_KEY)
}

pub fn bearer(key: &str) -> String {
    format!("Bearer {}", key)
}

/// A second organization with its own API key.
pub struct TestTenant {
    pub tenant_id: Uuid,
    pub api_key: String,
}

pub async fn create_tenant_with_key(state: &AppState, name: &str) -> TestTenant {
    let tenant = state
        .db
        .tenant_repository
        .create_tenant(name)
        .await
        .expect("Failed to create tenant");

    let api_key = generate_api_key();
    state
        .db
        .api_key_repository
        .create_api_key(
            tenant.id,
            None,
            "integration-test",
            &hash_api_key(&api_key),
            &extract_key_prefix(&api_key),
        )
        .await
        .expect("Failed to create API key");

    TestTenant {
        tenant_id: tenant.id,
        api_key,
    }
}
