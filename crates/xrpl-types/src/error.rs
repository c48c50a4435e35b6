use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("unknown result code: {0}")]
    UnknownResultCode(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
