//! Application-wide constants.

use uuid::Uuid;

/// Tenant used when authenticating with the master API key.
pub const DEFAULT_TENANT_ID: Uuid = Uuid::from_u128(0x6f1c_2a9e_4b7d_4e3a_9c15_d8b2_7f40_a1e6);

/// User id attached to master API key requests.
pub const DEFAULT_USER_ID: Uuid = Uuid::from_u128(0x0d3e_8b51_7c2f_4a96_b4e8_1f6a_92c7_53d0);

/// The only document type accepted for extraction.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Prefix of every generated object key.
pub const UPLOAD_KEY_PREFIX: &str = "uploads";
