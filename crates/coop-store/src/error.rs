use thiserror::Error;

/// Persistence failures. Per §7, every variant here is `StoreError`-fatal
/// from the orchestrator's point of view: the active transaction is rolled
/// back and the run aborts, since a store fault threatens data integrity.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to store: {0}")]
    Connection(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("failed to (de)serialize a stored field: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("schema migration failed: {0}")]
    Migration(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for coop_core::CoopError {
    fn from(err: StoreError) -> Self {
        coop_core::CoopError::StoreError(err.to_string())
    }
}
