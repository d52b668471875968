//! Storage-specific error type wrapping sqlx errors.

use coolhub_domain::error::ListenerError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored value is not valid JSON.
    #[error("JSON deserialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for ListenerError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
