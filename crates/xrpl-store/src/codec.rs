//! Canonical byte encoding for ledger entries.
//!
//! Layout: the two-byte big-endian [`LedgerEntryType`] code followed by the
//! bincode encoding of the entry. Entry structs hold no hash maps and all
//! decimals are normalized before they are stored, so equal entries always
//! encode to equal bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use xrpl_types::{Hash256, LedgerEntryType};

use crate::entry::LedgerEntry;
use crate::error::{StoreError, StoreResult};

/// Encode any serializable value canonically (no type tag).
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a value produced by [`to_canonical_bytes`].
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Encode a ledger entry with its type tag.
pub fn encode<T: LedgerEntry>(entry: &T) -> StoreResult<Vec<u8>> {
    let body = to_canonical_bytes(entry)?;
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(&T::ENTRY_TYPE.code().to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// The type tag of encoded entry bytes.
pub fn entry_type_of(key: &Hash256, bytes: &[u8]) -> StoreResult<LedgerEntryType> {
    let tag: [u8; 2] = bytes
        .get(..2)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| StoreError::CorruptEntry {
            key: *key,
            reason: "missing type tag".into(),
        })?;
    let code = u16::from_be_bytes(tag);
    LedgerEntryType::from_code(code).ok_or_else(|| StoreError::CorruptEntry {
        key: *key,
        reason: format!("unknown type tag {code:#06x}"),
    })
}

/// Decode entry bytes stored under `key`, confirming the type tag.
pub fn decode<T: LedgerEntry>(key: &Hash256, bytes: &[u8]) -> StoreResult<T> {
    let found = entry_type_of(key, bytes)?;
    if found != T::ENTRY_TYPE {
        return Err(StoreError::EntryTypeMismatch {
            key: *key,
            expected: T::ENTRY_TYPE,
            found,
        });
    }
    bincode::deserialize(&bytes[2..]).map_err(|e| StoreError::CorruptEntry {
        key: *key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use xrpl_types::{AccountId, Currency, Drops};

    use super::*;
    use crate::entry::{AccountRoot, RippleState, Ticket};

    fn key() -> Hash256 {
        Hash256::from_hash([1; 32])
    }

    #[test]
    fn account_root_roundtrip() {
        let root = AccountRoot::new(AccountId::from_bytes([1; 20]), Drops::new(50), 7);
        let bytes = encode(&root).unwrap();
        assert_eq!(&bytes[..2], &[0x00, 0x61]);
        assert_eq!(decode::<AccountRoot>(&key(), &bytes).unwrap(), root);
    }

    #[test]
    fn decode_rejects_other_kind() {
        let ticket = Ticket {
            account: AccountId::from_bytes([1; 20]),
            ticket_sequence: 3,
        };
        let bytes = encode(&ticket).unwrap();
        let err = decode::<AccountRoot>(&key(), &bytes).unwrap_err();
        assert!(matches!(
            err,
            StoreError::EntryTypeMismatch {
                expected: LedgerEntryType::AccountRoot,
                found: LedgerEntryType::Ticket,
                ..
            }
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode::<AccountRoot>(&key(), &[0x00]),
            Err(StoreError::CorruptEntry { .. })
        ));
        assert!(matches!(
            decode::<AccountRoot>(&key(), &[0xFF, 0xFF, 1, 2]),
            Err(StoreError::CorruptEntry { .. })
        ));
        assert!(matches!(
            decode::<AccountRoot>(&key(), &[0x00, 0x61, 1]),
            Err(StoreError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn equal_lines_encode_equal() {
        let usd = Currency::from_code("USD").unwrap();
        let a = AccountId::from_bytes([1; 20]);
        let b = AccountId::from_bytes([2; 20]);
        let mut one = RippleState::new(&a, &b, usd);
        let mut two = RippleState::new(&b, &a, usd);
        one.set_balance_for(&a, dec!(1.50));
        two.set_balance_for(&a, dec!(1.5));
        assert_eq!(encode(&one).unwrap(), encode(&two).unwrap());
    }
}
