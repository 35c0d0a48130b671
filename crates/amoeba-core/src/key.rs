//! Key: the content address of one block.
//!
//! A key pairs a hash-algorithm tag with the digest of a block's bytes.
//! Identity equals integrity: a block is the block named by a key exactly
//! when its digest matches.

use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;

use crate::error::{FormatError, IntegrityError, ValidationError};
use crate::wire::{put_record, RecordReader};

/// Maximum digest length in bytes.
pub const MAX_DIGEST_LEN: usize = 32;

/// Field tags for the canonical encoding.
mod tag {
    pub const ALGORITHM: u8 = 0;
    pub const DIGEST: u8 = 1;
}

/// The digest algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum HashAlgorithm {
    /// Blake3, 32-byte output.
    #[default]
    Blake3 = 0,
}

impl HashAlgorithm {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Blake3),
            _ => None,
        }
    }

    /// Digest `content` with this algorithm.
    pub fn digest(self, content: &[u8]) -> Vec<u8> {
        match self {
            Self::Blake3 => blake3::hash(content).as_bytes().to_vec(),
        }
    }
}

/// A content fingerprint: hash-algorithm tag plus digest, at most 32 bytes.
///
/// Keys are immutable after construction. Equality is structural over the
/// algorithm and the exact digest bytes; a 32-bit hash code derived from
/// the leading digest bytes is cached at construction for fast map and set
/// placement (it is not a cryptographic value).
#[derive(Clone)]
pub struct Key {
    algorithm: HashAlgorithm,
    digest: Bytes,
    hash_code: u32,
}

impl Key {
    /// Create a key from an algorithm tag and raw digest bytes.
    ///
    /// Rejects digests longer than [`MAX_DIGEST_LEN`].
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self, ValidationError> {
        if digest.len() > MAX_DIGEST_LEN {
            return Err(ValidationError::DigestTooLong {
                len: digest.len(),
                max: MAX_DIGEST_LEN,
            });
        }
        let hash_code = leading_bytes_hash(&digest);
        Ok(Self {
            algorithm,
            digest: digest.into(),
            hash_code,
        })
    }

    /// Derive the key naming `content` under the default algorithm.
    pub fn for_content(content: &[u8]) -> Self {
        let algorithm = HashAlgorithm::default();
        let digest = algorithm.digest(content);
        let hash_code = leading_bytes_hash(&digest);
        Self {
            algorithm,
            digest: digest.into(),
            hash_code,
        }
    }

    /// Check that `content` is the block this key names.
    ///
    /// Recomputes the digest under this key's algorithm and requires an
    /// exact match.
    pub fn verify_content(&self, content: &[u8]) -> Result<(), IntegrityError> {
        let actual = self.algorithm.digest(content);
        if actual != self.digest {
            return Err(IntegrityError::DigestMismatch {
                expected: self.to_hex(),
                actual: hex::encode(&actual),
            });
        }
        Ok(())
    }

    /// The digest algorithm tag.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// The cached non-cryptographic hash code.
    pub fn hash_code(&self) -> u32 {
        self.hash_code
    }

    /// True for the default key (empty digest).
    pub fn is_empty(&self) -> bool {
        self.digest.is_empty()
    }

    /// Convert the digest to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }

    /// Parse a key from a hex digest string, under the default algorithm.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() > MAX_DIGEST_LEN {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let hash_code = leading_bytes_hash(&bytes);
        Ok(Self {
            algorithm: HashAlgorithm::default(),
            digest: bytes.into(),
            hash_code,
        })
    }

    /// Encode to canonical bytes.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if self.algorithm != HashAlgorithm::default() {
            put_record(&mut buf, tag::ALGORITHM, &[self.algorithm.to_u8()]);
        }
        if !self.digest.is_empty() {
            put_record(&mut buf, tag::DIGEST, &self.digest);
        }
        buf
    }

    /// Decode from canonical bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut algorithm = HashAlgorithm::default();
        let mut digest = Vec::new();

        let mut reader = RecordReader::new(bytes);
        while let Some(record) = reader.next_record()? {
            match record.tag {
                tag::ALGORITHM => {
                    let value = record.as_u8()?;
                    algorithm = HashAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "hash",
                            value,
                        },
                    )?;
                }
                tag::DIGEST => digest = record.payload.to_vec(),
                _ => {}
            }
        }

        Ok(Self::new(algorithm, digest)?)
    }
}

impl Default for Key {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            digest: Bytes::new(),
            hash_code: 0,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        // Cached hash codes reject most mismatches without touching bytes.
        self.hash_code == other.hash_code
            && self.algorithm == other.algorithm
            && self.digest == other.digest
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.to_hex();
        write!(f, "Key({})", &h[..h.len().min(16)])
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.to_hex();
        write!(f, "{}", &h[..h.len().min(16)])
    }
}

/// Fold the leading digest bytes into a u32, zero-padded.
fn leading_bytes_hash(digest: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    let n = digest.len().min(4);
    bytes[..n].copy_from_slice(&digest[..n]);
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_length_ceiling() {
        assert!(Key::new(HashAlgorithm::Blake3, vec![0u8; 32]).is_ok());
        assert!(matches!(
            Key::new(HashAlgorithm::Blake3, vec![0u8; 33]),
            Err(ValidationError::DigestTooLong { len: 33, max: 32 })
        ));
    }

    #[test]
    fn test_for_content_matches_verify() {
        let key = Key::for_content(b"block bytes");
        assert_eq!(key.digest().len(), 32);
        assert!(key.verify_content(b"block bytes").is_ok());
        assert!(matches!(
            key.verify_content(b"other bytes"),
            Err(IntegrityError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_hash_code_from_leading_bytes() {
        let key = Key::new(HashAlgorithm::Blake3, vec![0x01, 0x02, 0x03, 0x04, 0xff]).unwrap();
        assert_eq!(key.hash_code(), u32::from_le_bytes([1, 2, 3, 4]));

        // Short digests zero-pad.
        let short = Key::new(HashAlgorithm::Blake3, vec![0xaa]).unwrap();
        assert_eq!(short.hash_code(), 0xaa);
    }

    #[test]
    fn test_canonical_roundtrip() {
        let key = Key::for_content(b"payload");
        let bytes = key.to_canonical_bytes();
        let decoded = Key::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(key, decoded);
        assert_eq!(decoded.hash_code(), key.hash_code());
    }

    #[test]
    fn test_canonical_bytes_exact() {
        let key = Key::new(HashAlgorithm::Blake3, vec![1, 2, 3]).unwrap();
        // Default algorithm is omitted; only the digest record is emitted.
        assert_eq!(key.to_canonical_bytes(), vec![3, 0, 0, 0, 1, 1, 2, 3]);
    }

    #[test]
    fn test_default_key_encodes_empty() {
        let key = Key::default();
        assert!(key.is_empty());
        assert!(key.to_canonical_bytes().is_empty());
        let decoded = Key::from_canonical_bytes(&[]).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_unknown_field_tag_skipped() {
        let mut bytes = Key::new(HashAlgorithm::Blake3, vec![9, 9]).unwrap().to_canonical_bytes();
        put_record(&mut bytes, 0x44, b"from the future");
        let decoded = Key::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(decoded.digest(), &[9, 9]);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let mut bytes = Vec::new();
        put_record(&mut bytes, 1, &[0xab]);
        // Tag 0 with an undefined algorithm value.
        put_record(&mut bytes, 0, &[7]);
        assert!(matches!(
            Key::from_canonical_bytes(&bytes),
            Err(FormatError::UnknownAlgorithm {
                family: "hash",
                value: 7
            })
        ));
    }

    #[test]
    fn test_oversized_digest_rejected_on_decode() {
        let mut bytes = Vec::new();
        put_record(&mut bytes, 1, &[0u8; 40]);
        assert!(matches!(
            Key::from_canonical_bytes(&bytes),
            Err(FormatError::Validation(ValidationError::DigestTooLong { .. }))
        ));
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = Key::for_content(b"abc");
        let recovered = Key::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, recovered);
    }

    #[test]
    fn test_debug_truncates() {
        let key = Key::for_content(b"x");
        let debug = format!("{:?}", key);
        assert!(debug.starts_with("Key("));
        assert_eq!(debug.len(), "Key(".len() + 16 + 1);

        // Keys shorter than the truncation window still format.
        let short = Key::new(HashAlgorithm::Blake3, vec![1]).unwrap();
        assert_eq!(format!("{:?}", short), "Key(01)");
    }
}
