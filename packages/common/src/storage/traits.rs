use async_trait::async_trait;

use super::error::StorageError;

/// Path-addressed storage for user-uploaded media.
///
/// Paths are relative, `/`-separated, and never contain `..` segments.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write `data` at `path`, replacing any existing file.
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether a file exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete the file at `path`.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
