/// Failures of a [`MediaStore`](super::MediaStore) operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The relative path is empty, absolute, or escapes the storage root.
    #[error("invalid media path: {0}")]
    InvalidPath(String),
    #[error("upload exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}
