use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Every check runs before any parameter is touched, so an `Err` always means
/// the network is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("batch must contain at least one sample")]
    EmptyBatch,
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
