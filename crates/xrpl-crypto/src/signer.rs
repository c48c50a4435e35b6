use serde::{Deserialize, Serialize};
use xrpl_types::AccountId;

/// Prefix byte marking an Ed25519 public key.
pub const ED25519_PREFIX: u8 = 0xED;

/// Ed25519 signing key (private).
pub struct SigningKey(ed25519_dalek::SigningKey);

/// A public key as carried in a transaction's `SigningPubKey`.
///
/// Ed25519 keys are 33 bytes: `0xED` followed by the 32-byte key. secp256k1
/// keys are 33-byte compressed points starting with `0x02` or `0x03`; they
/// are recognised as well-formed but this crate cannot verify them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(Vec<u8>);

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// The prefixed public key.
    pub fn public_key(&self) -> PublicKey {
        let mut bytes = Vec::with_capacity(33);
        bytes.push(ED25519_PREFIX);
        bytes.extend_from_slice(self.0.verifying_key().as_bytes());
        PublicKey(bytes)
    }

    /// The account this key controls as its master key.
    pub fn account_id(&self) -> AccountId {
        self.public_key().account_id()
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        use ed25519_dalek::Signer;
        self.0.sign(message).to_bytes().to_vec()
    }
}

impl PublicKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ed25519 or compressed secp256k1, by length and prefix.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 33 && matches!(self.0[0], ED25519_PREFIX | 0x02 | 0x03)
    }

    pub fn is_ed25519(&self) -> bool {
        self.0.len() == 33 && self.0[0] == ED25519_PREFIX
    }

    /// `RIPEMD160(SHA256(key))`.
    pub fn account_id(&self) -> AccountId {
        AccountId::from_public_key(&self.0)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode_upper(&self.0))
    }
}

/// Errors from signature checks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
    #[error("unsupported key type")]
    UnsupportedKey,
}

/// The signature-checking collaborator used by the engine.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        public_key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError>;
}

/// Verifies `0xED`-prefixed Ed25519 keys; rejects every other key type.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        use ed25519_dalek::Verifier;

        if !public_key.is_ed25519() {
            return Err(SignatureError::UnsupportedKey);
        }
        let raw: [u8; 32] = public_key.0[1..]
            .try_into()
            .map_err(|_| SignatureError::InvalidKey)?;
        let key =
            ed25519_dalek::VerifyingKey::from_bytes(&raw).map_err(|_| SignatureError::InvalidKey)?;
        let sig: [u8; 64] = signature
            .try_into()
            .map_err(|_| SignatureError::InvalidSignature)?;
        key.verify(message, &ed25519_dalek::Signature::from_bytes(&sig))
            .map_err(|_| SignatureError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"hello world");
        assert!(Ed25519Verifier
            .verify(&sk.public_key(), b"hello world", &sig)
            .is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"correct message");
        assert_eq!(
            Ed25519Verifier.verify(&sk.public_key(), b"wrong message", &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let sig = SigningKey::generate().sign(b"message");
        let other = SigningKey::generate().public_key();
        assert!(Ed25519Verifier.verify(&other, b"message", &sig).is_err());
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"m");
        assert_eq!(
            Ed25519Verifier.verify(&sk.public_key(), b"m", &sig[..63]),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn secp_keys_are_well_formed_but_unsupported() {
        let mut bytes = vec![0x02u8];
        bytes.extend_from_slice(&[7u8; 32]);
        let pk = PublicKey::from_bytes(bytes);
        assert!(pk.is_well_formed());
        assert!(!pk.is_ed25519());
        assert_eq!(
            Ed25519Verifier.verify(&pk, b"m", &[0u8; 64]),
            Err(SignatureError::UnsupportedKey)
        );
    }

    #[test]
    fn public_key_shape() {
        let pk = SigningKey::from_bytes([3u8; 32]).public_key();
        assert_eq!(pk.as_bytes().len(), 33);
        assert_eq!(pk.as_bytes()[0], ED25519_PREFIX);
        assert!(pk.is_well_formed());
        assert!(!PublicKey::from_bytes(vec![0xED; 10]).is_well_formed());
    }

    #[test]
    fn account_id_is_stable_per_key() {
        let sk = SigningKey::from_bytes([9u8; 32]);
        assert_eq!(sk.account_id(), SigningKey::from_bytes([9u8; 32]).account_id());
        assert_ne!(sk.account_id(), SigningKey::from_bytes([8u8; 32]).account_id());
    }

    #[test]
    fn debug_redacts_signing_key() {
        let debug = format!("{:?}", SigningKey::generate());
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn public_key_serde_is_transparent() {
        let pk = PublicKey::from_bytes(vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&pk).unwrap(), "[1,2,3]");
    }
}
