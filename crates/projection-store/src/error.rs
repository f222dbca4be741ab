use thiserror::Error;

/// Errors that can occur when talking to the secondary store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached. Retried by [`crate::RetryingStore`].
    #[error("Connection error: {0}")]
    Connection(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to its projection type.
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    /// Returns true if the failure is transient and the call may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Connection(_) => true,
            StoreError::Database(err) => {
                matches!(err, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
            }
            StoreError::Migration(_) | StoreError::InvalidRow(_) => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
