use xrpl_types::{AccountId, Hash256, LedgerEntryType};

/// Errors from ledger view operations.
///
/// None of these are rule violations. A transaction that runs into one has
/// hit a bug or corrupt state and the engine reports `tefINTERNAL`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Update or erase of a key that holds nothing.
    #[error("entry not found: {0}")]
    NotFound(Hash256),

    /// Insert over a key that already holds an entry.
    #[error("entry already exists: {0}")]
    AlreadyExists(Hash256),

    /// The stored bytes decode to a different kind than the keylet promises.
    #[error("entry {key} has type {found}, expected {expected}")]
    EntryTypeMismatch {
        key: Hash256,
        expected: LedgerEntryType,
        found: LedgerEntryType,
    },

    /// The stored bytes cannot be decoded at all.
    #[error("corrupt entry {key}: {reason}")]
    CorruptEntry { key: Hash256, reason: String },

    /// Encoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The owner directory has no room for another entry.
    #[error("owner directory of {0} is full")]
    DirectoryFull(AccountId),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
