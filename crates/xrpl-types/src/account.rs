use std::fmt;
use std::hash::Hash;

use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Version byte prepended to account IDs before base58check encoding.
const ACCOUNT_ID_VERSION: u8 = 0;

/// A 160-bit account identifier.
///
/// Ordering is plain byte order. Symmetric objects (trust lines) rely on it
/// to pick their low and high side, so it must never change.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// `rrrrrrrrrrrrrrrrrrrrrhoLvTp`: never a valid source or destination.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the account controlled by a public key:
    /// `RIPEMD160(SHA256(public_key))`.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let sha = Sha256::digest(public_key);
        let rip = Ripemd160::digest(sha);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&rip);
        Self(bytes)
    }

    /// A random account, for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 20];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Returns `true` for the all-zero account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Upper-case hex of the raw bytes.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parse raw bytes from 40 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Encode as a classic `r...` address (base58check, XRPL alphabet).
    pub fn to_address(&self) -> String {
        bs58::encode(self.0)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check_version(ACCOUNT_ID_VERSION)
            .into_string()
    }

    /// Decode a classic `r...` address, verifying version and checksum.
    pub fn from_address(address: &str) -> Result<Self, TypeError> {
        // The decoded payload keeps its leading version byte.
        let data = bs58::decode(address)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check(Some(ACCOUNT_ID_VERSION))
            .into_vec()
            .map_err(|e| TypeError::InvalidAddress(format!("{address}: {e}")))?;
        let bytes: [u8; 20] = data
            .get(1..)
            .and_then(|body| body.try_into().ok())
            .ok_or_else(|| {
                TypeError::InvalidAddress(format!(
                    "decoded length {} (expected 21)",
                    data.len()
                ))
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_address())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl std::str::FromStr for AccountId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_ADDRESS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const GENESIS_HEX: &str = "B5F762798A53D543A014CAF8B297CFF8F2F937E8";

    #[test]
    fn zero_account_address() {
        assert_eq!(AccountId::ZERO.to_address(), "rrrrrrrrrrrrrrrrrrrrrhoLvTp");
    }

    #[test]
    fn genesis_account_decodes_to_known_bytes() {
        let id = AccountId::from_address(GENESIS_ADDRESS).unwrap();
        assert_eq!(id.to_hex(), GENESIS_HEX);
        assert_eq!(id.to_address(), GENESIS_ADDRESS);
    }

    #[test]
    fn address_rejects_bad_checksum() {
        // Last character altered.
        let err = AccountId::from_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTi").unwrap_err();
        assert!(matches!(err, TypeError::InvalidAddress(_)));
    }

    #[test]
    fn address_rejects_foreign_alphabet() {
        // '0' is not part of the alphabet.
        assert!(AccountId::from_address("r0000000000000000000000000").is_err());
    }

    #[test]
    fn address_rejects_other_version_byte() {
        // Valid base58check, but with the node-public-key version (28).
        let foreign = bs58::encode([1u8; 20])
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check_version(28)
            .into_string();
        assert!(matches!(
            AccountId::from_address(&foreign),
            Err(TypeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn address_rejects_wrong_payload_length() {
        let short = bs58::encode([2u8; 19])
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check_version(0)
            .into_string();
        assert!(AccountId::from_address(&short).is_err());
    }

    #[test]
    fn hex_roundtrip() {
        let id = AccountId::from_bytes([7u8; 20]);
        assert_eq!(AccountId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn from_public_key_is_deterministic() {
        let pk = [0xEDu8; 33];
        assert_eq!(AccountId::from_public_key(&pk), AccountId::from_public_key(&pk));
        assert_ne!(
            AccountId::from_public_key(&pk),
            AccountId::from_public_key(&[0x02u8; 33])
        );
    }

    #[test]
    fn ephemeral_accounts_are_unique() {
        assert_ne!(AccountId::ephemeral(), AccountId::ephemeral());
    }

    #[test]
    fn parse_via_from_str() {
        let id: AccountId = GENESIS_ADDRESS.parse().unwrap();
        assert_eq!(format!("{id}"), GENESIS_ADDRESS);
    }

    proptest::proptest! {
        #[test]
        fn address_roundtrip(bytes in proptest::array::uniform20(proptest::num::u8::ANY)) {
            let id = AccountId::from_bytes(bytes);
            proptest::prop_assert_eq!(AccountId::from_address(&id.to_address()).unwrap(), id);
        }
    }
}
