//! Index: the ordered group list that reassembles one payload.
//!
//! Groups are concatenated in order to rebuild the transformed payload.
//! The index also carries which compression and encryption were applied
//! to the whole payload before chunking (so they apply uniformly to all
//! groups), plus the symmetric key when encryption is active.

use bytes::Bytes;

use crate::error::{FormatError, ValidationError};
use crate::group::Group;
use crate::wire::{put_record, RecordReader};

/// Field tags for the canonical encoding.
mod tag {
    pub const COMPRESSION: u8 = 0;
    pub const CRYPTO: u8 = 1;
    pub const CRYPTO_KEY: u8 = 2;
    pub const GROUP: u8 = 3;
}

/// The compression algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompressionAlgorithm {
    #[default]
    None = 0,
    Deflate = 1,
}

impl CompressionAlgorithm {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// The symmetric encryption algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CryptoAlgorithm {
    #[default]
    None = 0,
    ChaCha20Poly1305 = 1,
}

impl CryptoAlgorithm {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }
}

/// An ordered sequence of groups representing one payload.
///
/// Immutable after construction. `crypto_key` is present exactly when
/// `crypto` is not [`CryptoAlgorithm::None`]; the pairing is checked at
/// construction and preserved by encode through field omission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    compression: CompressionAlgorithm,
    crypto: CryptoAlgorithm,
    crypto_key: Option<Bytes>,
    groups: Vec<Group>,
}

impl Index {
    /// Create an index, validating the crypto-key pairing.
    pub fn new(
        compression: CompressionAlgorithm,
        crypto: CryptoAlgorithm,
        crypto_key: Option<Vec<u8>>,
        groups: Vec<Group>,
    ) -> Result<Self, ValidationError> {
        match (crypto, &crypto_key) {
            (CryptoAlgorithm::None, Some(_)) => return Err(ValidationError::UnexpectedCryptoKey),
            (CryptoAlgorithm::None, None) => {}
            (_, None) => return Err(ValidationError::MissingCryptoKey),
            (_, Some(_)) => {}
        }
        Ok(Self {
            compression,
            crypto,
            crypto_key: crypto_key.map(Bytes::from),
            groups,
        })
    }

    /// The compression algorithm tag.
    pub fn compression(&self) -> CompressionAlgorithm {
        self.compression
    }

    /// The encryption algorithm tag.
    pub fn crypto(&self) -> CryptoAlgorithm {
        self.crypto
    }

    /// The symmetric key material, when encryption is active.
    pub fn crypto_key(&self) -> Option<&[u8]> {
        self.crypto_key.as_deref()
    }

    /// The ordered groups.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Total byte count of the transformed payload across all groups.
    pub fn total_length(&self) -> u64 {
        self.groups.iter().map(|g| g.length()).sum()
    }

    /// Encode to canonical bytes.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if self.compression != CompressionAlgorithm::default() {
            put_record(&mut buf, tag::COMPRESSION, &[self.compression.to_u8()]);
        }
        if self.crypto != CryptoAlgorithm::default() {
            put_record(&mut buf, tag::CRYPTO, &[self.crypto.to_u8()]);
        }
        // The key is tied to the algorithm tag: omitted whenever crypto
        // is off, even if a stale key value is somehow held.
        if self.crypto != CryptoAlgorithm::None {
            if let Some(key) = &self.crypto_key {
                put_record(&mut buf, tag::CRYPTO_KEY, key);
            }
        }
        for group in &self.groups {
            put_record(&mut buf, tag::GROUP, &group.to_canonical_bytes());
        }
        buf
    }

    /// Decode from canonical bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut compression = CompressionAlgorithm::default();
        let mut crypto = CryptoAlgorithm::default();
        let mut crypto_key = None;
        let mut groups = Vec::new();

        let mut reader = RecordReader::new(bytes);
        while let Some(record) = reader.next_record()? {
            match record.tag {
                tag::COMPRESSION => {
                    let value = record.as_u8()?;
                    compression = CompressionAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "compression",
                            value,
                        },
                    )?;
                }
                tag::CRYPTO => {
                    let value = record.as_u8()?;
                    crypto = CryptoAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "crypto",
                            value,
                        },
                    )?;
                }
                tag::CRYPTO_KEY => crypto_key = Some(record.payload.to_vec()),
                tag::GROUP => groups.push(Group::from_canonical_bytes(record.payload)?),
                _ => {}
            }
        }

        Ok(Self::new(compression, crypto, crypto_key, groups)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::CorrectionAlgorithm;
    use crate::key::Key;

    fn sample_group(seed: u8) -> Group {
        let keys = (0..4)
            .map(|i| Key::for_content(&[seed, i]))
            .collect();
        Group::new(CorrectionAlgorithm::ReedSolomon8, 2, 4, 1000, keys).unwrap()
    }

    #[test]
    fn test_crypto_key_pairing() {
        // Key required when crypto is on.
        assert!(matches!(
            Index::new(
                CompressionAlgorithm::None,
                CryptoAlgorithm::ChaCha20Poly1305,
                None,
                Vec::new()
            ),
            Err(ValidationError::MissingCryptoKey)
        ));
        // Key forbidden when crypto is off.
        assert!(matches!(
            Index::new(
                CompressionAlgorithm::None,
                CryptoAlgorithm::None,
                Some(vec![0u8; 44]),
                Vec::new()
            ),
            Err(ValidationError::UnexpectedCryptoKey)
        ));
        assert!(Index::new(
            CompressionAlgorithm::Deflate,
            CryptoAlgorithm::ChaCha20Poly1305,
            Some(vec![0u8; 44]),
            Vec::new()
        )
        .is_ok());
        assert!(
            Index::new(CompressionAlgorithm::None, CryptoAlgorithm::None, None, Vec::new()).is_ok()
        );
    }

    #[test]
    fn test_canonical_roundtrip() {
        let index = Index::new(
            CompressionAlgorithm::Deflate,
            CryptoAlgorithm::ChaCha20Poly1305,
            Some(vec![7u8; 44]),
            vec![sample_group(1), sample_group(2)],
        )
        .unwrap();

        let decoded = Index::from_canonical_bytes(&index.to_canonical_bytes()).unwrap();
        assert_eq!(index, decoded);
        assert_eq!(decoded.groups().len(), 2);
        assert_eq!(decoded.crypto_key(), Some(&[7u8; 44][..]));
    }

    #[test]
    fn test_default_fields_are_omitted() {
        let index =
            Index::new(CompressionAlgorithm::None, CryptoAlgorithm::None, None, Vec::new())
                .unwrap();
        assert!(index.to_canonical_bytes().is_empty());

        let decoded = Index::from_canonical_bytes(&[]).unwrap();
        assert_eq!(index, decoded);
    }

    #[test]
    fn test_group_order_preserved() {
        let index = Index::new(
            CompressionAlgorithm::None,
            CryptoAlgorithm::None,
            None,
            vec![sample_group(1), sample_group(2), sample_group(3)],
        )
        .unwrap();

        let decoded = Index::from_canonical_bytes(&index.to_canonical_bytes()).unwrap();
        assert_eq!(decoded.groups()[0], sample_group(1));
        assert_eq!(decoded.groups()[1], sample_group(2));
        assert_eq!(decoded.groups()[2], sample_group(3));
    }

    #[test]
    fn test_total_length_sums_groups() {
        let index = Index::new(
            CompressionAlgorithm::None,
            CryptoAlgorithm::None,
            None,
            vec![sample_group(1), sample_group(2)],
        )
        .unwrap();
        assert_eq!(index.total_length(), 2000);
    }

    #[test]
    fn test_equal_indexes_encode_identically() {
        let make = || {
            Index::new(
                CompressionAlgorithm::Deflate,
                CryptoAlgorithm::None,
                None,
                vec![sample_group(9)],
            )
            .unwrap()
        };
        assert_eq!(make(), make());
        assert_eq!(make().to_canonical_bytes(), make().to_canonical_bytes());
    }

    #[test]
    fn test_unknown_field_tag_skipped() {
        let index = Index::new(
            CompressionAlgorithm::Deflate,
            CryptoAlgorithm::None,
            None,
            vec![sample_group(5)],
        )
        .unwrap();
        let mut bytes = index.to_canonical_bytes();
        put_record(&mut bytes, 0x60, b"???");
        assert_eq!(Index::from_canonical_bytes(&bytes).unwrap(), index);
    }

    #[test]
    fn test_orphan_crypto_key_rejected_on_decode() {
        let mut bytes = Vec::new();
        put_record(&mut bytes, 2, &[1u8; 44]);
        assert!(matches!(
            Index::from_canonical_bytes(&bytes),
            Err(FormatError::Validation(ValidationError::UnexpectedCryptoKey))
        ));
    }
}
