//! API constants
//!
//! Routes and the served OpenAPI document are both built from [`API_PREFIX`].

/// Versioned prefix for every protected route
pub const API_PREFIX: &str = "/api/v1";

/// Header accepted as an alternative to `Authorization: Bearer`
pub const API_KEY_HEADER: &str = "x-api-key";
