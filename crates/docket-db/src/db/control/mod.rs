pub mod api_key;
pub mod tenant;
pub mod user;

pub use api_key::ApiKeyRepository;
pub use tenant::TenantRepository;
pub use user::{UserInput, UserRepository};
