use orderflow_storage::StorageError;
use orderflow_types::ValidationError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for order gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors from the host platform order gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("gateway backend error: {0}")]
    Backend(String),
}

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::Storage(StorageError::NotFound(_))
                | EngineError::Gateway(GatewayError::OrderNotFound(_))
        )
    }
}
