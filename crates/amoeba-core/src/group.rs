//! Group: one erasure-coded slice of a transformed payload.
//!
//! A group records how a slice was split into `block_length` blocks such
//! that any `information_length` of them reconstruct the slice, plus the
//! exact original byte count (reconstruction truncates padding) and the
//! ordered keys of all blocks. Key order is significant: a key's position
//! is its erasure-coding block index. The group only carries parameters
//! and block identities; the coding math lives elsewhere.

use std::hash::{Hash, Hasher};

use crate::error::{FormatError, ValidationError};
use crate::key::Key;
use crate::wire::{put_record, put_u32, put_u64, RecordReader};

/// Field tags for the canonical encoding.
mod tag {
    pub const CORRECTION: u8 = 0;
    pub const INFORMATION_LENGTH: u8 = 1;
    pub const BLOCK_LENGTH: u8 = 2;
    pub const LENGTH: u8 = 3;
    pub const KEY: u8 = 4;
}

/// The forward-error-correction algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CorrectionAlgorithm {
    /// No redundancy: every block is required.
    #[default]
    None = 0,
    /// Reed-Solomon over GF(2^8).
    ReedSolomon8 = 1,
}

impl CorrectionAlgorithm {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::ReedSolomon8),
            _ => None,
        }
    }
}

/// An erasure-coded set of block keys plus reconstruction parameters.
///
/// Immutable after construction. Any `information_length` of the
/// `block_length` referenced blocks suffice to rebuild the slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    correction: CorrectionAlgorithm,
    information_length: u32,
    block_length: u32,
    length: u64,
    keys: Vec<Key>,
}

impl Group {
    /// Create a group, validating the erasure parameters.
    ///
    /// Both lengths must be positive with `information_length <=
    /// block_length`, `keys` must hold exactly `block_length` entries, and
    /// [`CorrectionAlgorithm::None`] admits no redundancy so it requires
    /// `information_length == block_length`.
    pub fn new(
        correction: CorrectionAlgorithm,
        information_length: u32,
        block_length: u32,
        length: u64,
        keys: Vec<Key>,
    ) -> Result<Self, ValidationError> {
        if information_length == 0
            || block_length == 0
            || information_length > block_length
            || (correction == CorrectionAlgorithm::None && information_length != block_length)
        {
            return Err(ValidationError::InvalidErasureParams {
                k: information_length,
                n: block_length,
            });
        }
        if keys.len() != block_length as usize {
            return Err(ValidationError::BlockCountMismatch {
                expected: block_length as usize,
                actual: keys.len(),
            });
        }
        Ok(Self {
            correction,
            information_length,
            block_length,
            length,
            keys,
        })
    }

    /// The forward-error-correction algorithm tag.
    pub fn correction(&self) -> CorrectionAlgorithm {
        self.correction
    }

    /// The number of blocks sufficient for reconstruction (k).
    pub fn information_length(&self) -> u32 {
        self.information_length
    }

    /// The total number of blocks (n).
    pub fn block_length(&self) -> u32 {
        self.block_length
    }

    /// The original byte count of this group's payload slice.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The ordered block keys. Position is the erasure block index.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// True once `present_count` blocks are enough to reconstruct.
    pub fn is_reconstructable(&self, present_count: usize) -> bool {
        present_count >= self.information_length as usize
    }

    /// The block index of `key` within this group, if it is a member.
    pub fn position_of(&self, key: &Key) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Encode to canonical bytes.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if self.correction != CorrectionAlgorithm::default() {
            put_record(&mut buf, tag::CORRECTION, &[self.correction.to_u8()]);
        }
        put_u32(&mut buf, tag::INFORMATION_LENGTH, self.information_length);
        put_u32(&mut buf, tag::BLOCK_LENGTH, self.block_length);
        if self.length != 0 {
            put_u64(&mut buf, tag::LENGTH, self.length);
        }
        // Every key record is emitted, even for an empty key: a key's
        // position is its block index, so elements cannot be dropped.
        for key in &self.keys {
            put_record(&mut buf, tag::KEY, &key.to_canonical_bytes());
        }
        buf
    }

    /// Decode from canonical bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut correction = CorrectionAlgorithm::default();
        let mut information_length = 0u32;
        let mut block_length = 0u32;
        let mut length = 0u64;
        let mut keys = Vec::new();

        let mut reader = RecordReader::new(bytes);
        while let Some(record) = reader.next_record()? {
            match record.tag {
                tag::CORRECTION => {
                    let value = record.as_u8()?;
                    correction = CorrectionAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "correction",
                            value,
                        },
                    )?;
                }
                tag::INFORMATION_LENGTH => information_length = record.as_u32()?,
                tag::BLOCK_LENGTH => block_length = record.as_u32()?,
                tag::LENGTH => length = record.as_u64()?,
                tag::KEY => keys.push(Key::from_canonical_bytes(record.payload)?),
                _ => {}
            }
        }

        Ok(Self::new(
            correction,
            information_length,
            block_length,
            length,
            keys,
        )?)
    }
}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.correction.hash(state);
        state.write_u32(self.information_length);
        state.write_u32(self.block_length);
        state.write_u64(self.length);
        for key in &self.keys {
            state.write_u32(key.hash_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_keys(n: usize) -> Vec<Key> {
        (0..n)
            .map(|i| Key::for_content(format!("block {i}").as_bytes()))
            .collect()
    }

    #[test]
    fn test_erasure_params_validated() {
        let keys = content_keys(4);

        assert!(Group::new(CorrectionAlgorithm::ReedSolomon8, 2, 4, 100, keys.clone()).is_ok());
        assert!(Group::new(CorrectionAlgorithm::ReedSolomon8, 4, 4, 100, keys.clone()).is_ok());

        // k > n
        assert!(matches!(
            Group::new(CorrectionAlgorithm::ReedSolomon8, 5, 4, 100, keys.clone()),
            Err(ValidationError::InvalidErasureParams { k: 5, n: 4 })
        ));
        // zero lengths
        assert!(Group::new(CorrectionAlgorithm::ReedSolomon8, 0, 4, 100, keys.clone()).is_err());
        assert!(Group::new(CorrectionAlgorithm::ReedSolomon8, 0, 0, 100, Vec::new()).is_err());
    }

    #[test]
    fn test_key_count_must_match_block_length() {
        let keys = content_keys(3);
        assert!(matches!(
            Group::new(CorrectionAlgorithm::ReedSolomon8, 2, 4, 100, keys),
            Err(ValidationError::BlockCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_no_correction_requires_all_blocks() {
        let keys = content_keys(4);
        assert!(matches!(
            Group::new(CorrectionAlgorithm::None, 2, 4, 100, keys.clone()),
            Err(ValidationError::InvalidErasureParams { k: 2, n: 4 })
        ));
        assert!(Group::new(CorrectionAlgorithm::None, 4, 4, 100, keys).is_ok());
    }

    #[test]
    fn test_reconstruction_threshold() {
        let group =
            Group::new(CorrectionAlgorithm::ReedSolomon8, 3, 5, 1000, content_keys(5)).unwrap();
        assert!(!group.is_reconstructable(0));
        assert!(!group.is_reconstructable(2));
        assert!(group.is_reconstructable(3));
        assert!(group.is_reconstructable(5));
    }

    #[test]
    fn test_position_is_block_index() {
        let keys = content_keys(5);
        let group = Group::new(
            CorrectionAlgorithm::ReedSolomon8,
            3,
            5,
            1000,
            keys.clone(),
        )
        .unwrap();
        assert_eq!(group.position_of(&keys[0]), Some(0));
        assert_eq!(group.position_of(&keys[4]), Some(4));
        assert_eq!(group.position_of(&Key::for_content(b"elsewhere")), None);
    }

    #[test]
    fn test_canonical_roundtrip() {
        let group = Group::new(
            CorrectionAlgorithm::ReedSolomon8,
            2,
            4,
            12345,
            content_keys(4),
        )
        .unwrap();
        let decoded = Group::from_canonical_bytes(&group.to_canonical_bytes()).unwrap();
        assert_eq!(group, decoded);
    }

    #[test]
    fn test_empty_keys_keep_their_position() {
        let mut keys = content_keys(3);
        keys[1] = Key::default();
        let group = Group::new(CorrectionAlgorithm::None, 3, 3, 60, keys.clone()).unwrap();

        let decoded = Group::from_canonical_bytes(&group.to_canonical_bytes()).unwrap();
        assert_eq!(decoded.keys().len(), 3);
        assert!(decoded.keys()[1].is_empty());
        assert_eq!(decoded.keys()[2], keys[2]);
    }

    #[test]
    fn test_equal_groups_encode_identically() {
        let a = Group::new(
            CorrectionAlgorithm::ReedSolomon8,
            2,
            3,
            500,
            content_keys(3),
        )
        .unwrap();
        let b = Group::new(
            CorrectionAlgorithm::ReedSolomon8,
            2,
            3,
            500,
            content_keys(3),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_canonical_bytes(), b.to_canonical_bytes());
    }

    #[test]
    fn test_unknown_field_tag_skipped() {
        let group = Group::new(CorrectionAlgorithm::None, 2, 2, 40, content_keys(2)).unwrap();
        let mut bytes = group.to_canonical_bytes();
        put_record(&mut bytes, 0x50, &[1, 2, 3]);
        let decoded = Group::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(group, decoded);
    }

    #[test]
    fn test_invalid_params_rejected_on_decode() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 1, 9);
        put_u32(&mut bytes, 2, 4);
        for key in content_keys(4) {
            put_record(&mut bytes, 4, &key.to_canonical_bytes());
        }
        assert!(matches!(
            Group::from_canonical_bytes(&bytes),
            Err(FormatError::Validation(
                ValidationError::InvalidErasureParams { k: 9, n: 4 }
            ))
        ));
    }
}
