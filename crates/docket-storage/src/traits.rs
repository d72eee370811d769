//! Storage abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Opaque blob store addressed by key.
///
/// Keys are generated by [`crate::generate_object_key`] and are never derived
/// from tenant data or file names.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key`, keeping `content_type` as object metadata.
    /// Returns the object's URL.
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Read the full object at `key`.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Content type recorded at write time, if any.
    async fn content_type(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete the object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}
