use sha2::{Digest, Sha512};
use xrpl_types::Hash256;

/// Four-byte prefixes that separate the things the network hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashPrefix([u8; 4]);

impl HashPrefix {
    /// Transaction ID: `"TXN\0"`.
    pub const TRANSACTION_ID: Self = Self(*b"TXN\0");
    /// Single-signer signing data: `"STX\0"`.
    pub const TX_SIGN: Self = Self(*b"STX\0");

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// The first half of SHA-512 over the concatenated parts.
///
/// This is the network's general-purpose 256-bit hash: keylets, transaction
/// IDs and signing digests all go through it.
pub fn sha512_half(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let full = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&full[..32]);
    Hash256::from_hash(out)
}

/// [`sha512_half`] with a [`HashPrefix`] in front.
pub fn prefixed_hash(prefix: HashPrefix, data: &[u8]) -> Hash256 {
    sha512_half(&[prefix.as_bytes(), data])
}

/// Domain-separated BLAKE3 content hasher.
///
/// Used for local digests that never leave the node (state fingerprints in
/// tests and diagnostics), where a fast hash is preferable to SHA-512.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for whole-state fingerprints.
    pub const STATE: Self = Self {
        domain: "xrpl-state-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Hash256 {
        self.hash_parts(std::iter::once(data))
    }

    /// Hash a sequence of length-delimited parts with domain separation.
    ///
    /// Each part is prefixed with its length so `["ab", "c"]` and
    /// `["a", "bc"]` differ.
    pub fn hash_parts<'a>(&self, parts: impl IntoIterator<Item = &'a [u8]>) -> Hash256 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(&(part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Hash256::from_hash(*hasher.finalize().as_bytes())
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512_half_known_vector() {
        // First 32 bytes of SHA-512("abc").
        let h = sha512_half(&[b"abc"]);
        assert_eq!(
            h.to_hex(),
            "DDAF35A193617ABACC417349AE20413112E6FA4E89A97EA20A9EEEE64B55D39A"
        );
    }

    #[test]
    fn sha512_half_concatenates_parts() {
        assert_eq!(sha512_half(&[b"ab", b"c"]), sha512_half(&[b"abc"]));
    }

    #[test]
    fn prefixes_separate_domains() {
        let data = b"payload";
        assert_ne!(
            prefixed_hash(HashPrefix::TRANSACTION_ID, data),
            prefixed_hash(HashPrefix::TX_SIGN, data)
        );
        assert_eq!(HashPrefix::TRANSACTION_ID.as_bytes(), &[0x54, 0x58, 0x4E, 0x00]);
        assert_eq!(HashPrefix::TX_SIGN.as_bytes(), &[0x53, 0x54, 0x58, 0x00]);
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(
            ContentHasher::STATE.hash(b"hello"),
            ContentHasher::STATE.hash(b"hello")
        );
    }

    #[test]
    fn content_hash_domains_differ() {
        let custom = ContentHasher::new("other-v1");
        assert_ne!(custom.hash(b"x"), ContentHasher::STATE.hash(b"x"));
        assert_eq!(custom.domain(), "other-v1");
    }

    #[test]
    fn part_boundaries_matter() {
        let a = ContentHasher::STATE.hash_parts([b"ab".as_slice(), b"c".as_slice()]);
        let b = ContentHasher::STATE.hash_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }
}
