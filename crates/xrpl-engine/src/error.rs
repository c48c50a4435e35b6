use xrpl_store::StoreError;
use xrpl_types::ResultCode;

/// A transaction rule violation: the outcome code plus free-text detail.
///
/// The code alone drives control flow; `diagnostic` is for logs and
/// callers and is never parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {diagnostic}")]
pub struct TxFailure {
    pub code: ResultCode,
    pub diagnostic: String,
}

impl TxFailure {
    pub fn new(code: ResultCode, diagnostic: impl Into<String>) -> Self {
        Self {
            code,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Result of a transactor step.
pub type TxResult<T> = Result<T, TxFailure>;

/// Shorthand for returning a failure from a transactor step.
pub fn reject<T>(code: ResultCode, diagnostic: impl Into<String>) -> TxResult<T> {
    Err(TxFailure::new(code, diagnostic))
}

impl From<StoreError> for TxFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DirectoryFull(_) => Self::new(ResultCode::TecDirFull, err.to_string()),
            other => {
                tracing::warn!(error = %other, "ledger view failure");
                Self::new(ResultCode::TefInternal, other.to_string())
            }
        }
    }
}

/// Errors outside transaction processing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A transaction could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use xrpl_types::{AccountId, Hash256};

    use super::*;

    #[test]
    fn display_keeps_code_and_text_apart() {
        let f = TxFailure::new(ResultCode::TecNoEntry, "check missing");
        assert_eq!(f.to_string(), "tecNO_ENTRY: check missing");
        assert_eq!(f.code, ResultCode::TecNoEntry);
    }

    #[test]
    fn store_errors_map_to_codes() {
        let full: TxFailure = StoreError::DirectoryFull(AccountId::ZERO).into();
        assert_eq!(full.code, ResultCode::TecDirFull);
        let missing: TxFailure = StoreError::NotFound(Hash256::zero()).into();
        assert_eq!(missing.code, ResultCode::TefInternal);
    }

    #[test]
    fn reject_builds_err() {
        let r: TxResult<()> = reject(ResultCode::TemMalformed, "x");
        assert_eq!(r.unwrap_err().code, ResultCode::TemMalformed);
    }
}
