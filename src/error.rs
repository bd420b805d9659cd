use thiserror::Error;

#[cfg(feature = "postgres")]
use deadpool_postgres::{CreatePoolError, PoolError};
#[cfg(feature = "postgres")]
use tokio_postgres;

#[derive(Debug, Error)]
pub enum PgKeenError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] PoolError),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    CreatePoolError(#[from] CreatePoolError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Missing value for named parameter `{name}`")]
    MissingParameter { name: String },

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Expected 0 or 1 row, got {count}")]
    UnexpectedRowCount { count: usize },

    #[error("Expected a single value, got {count} columns")]
    UnexpectedColumnCount { count: usize },

    /// The transaction body failed and the rollback failed as well.
    #[error("{error}; rollback also failed: {rollback_error}")]
    RollbackFailed {
        error: Box<PgKeenError>,
        rollback_error: Box<PgKeenError>,
    },

    /// The synchronized body failed and releasing the advisory lock failed as well.
    #[error("{error}; advisory unlock also failed: {unlock_error}")]
    UnlockFailed {
        error: Box<PgKeenError>,
        unlock_error: Box<PgKeenError>,
    },

    #[error("Other database error: {0}")]
    Other(String),
}
