//! Docket storage library
//!
//! Object Store Client for uploaded documents: the [`Storage`] trait plus
//! S3 (via `object_store`) and local filesystem backends.
//!
//! # Key format
//!
//! `uploads/{uuid}`. Keys carry no tenant or file name information; tenant
//! isolation is enforced by the record store, which maps ids to keys.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use docket_core::StorageBackend;
pub use factory::create_storage;
pub use keys::generate_object_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
