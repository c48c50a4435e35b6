//! Cryptographic primitives for the XRPL transaction engine.
//!
//! Provides SHA-512Half hashing with network prefixes, keylet derivation for
//! every ledger object kind, Ed25519 signing/verification behind the
//! [`SignatureVerifier`] seam, and a BLAKE3 content hasher for local digests.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod hasher;
pub mod keylet;
pub mod signer;

pub use hasher::{prefixed_hash, sha512_half, ContentHasher, HashPrefix};
pub use keylet::Keylet;
pub use signer::{Ed25519Verifier, PublicKey, SignatureError, SignatureVerifier, SigningKey};
