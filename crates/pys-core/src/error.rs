use std::path::PathBuf;
use std::time::Duration;

/// Errors from storage engine operations.
///
/// A missing record is not an error: lookups return `Ok(None)` and listings
/// return an empty `Vec`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A record resolved to an identity that cannot address it.
    #[error("invalid identity {id:?}: {reason}")]
    InvalidIdentity { id: String, reason: String },

    /// The record type cannot be stored by any backend.
    #[error("unsupported record type {type_name:?}: {reason}")]
    UnsupportedRecordType { type_name: String, reason: String },

    /// The advisory lock guarding an address was not acquired in time.
    #[error("timed out after {timeout:?} waiting for lock {path}")]
    LockTimeout { path: PathBuf, timeout: Duration },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the relational engine, passed through unchanged.
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A schema-validated record rejected its own contents.
    #[error("validation failed for {type_name}: {reason}")]
    Validation { type_name: String, reason: String },
}

impl StorageError {
    /// Wrap an engine-specific error as [`StorageError::Database`].
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Database(Box::new(err))
    }

    pub(crate) fn invalid_identity(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
