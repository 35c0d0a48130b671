//! Seed: the user-facing descriptor of one piece of published content.
//!
//! A seed names a payload (name, size, keywords, comment, rank) and points
//! at the index that reconstructs it through its root key. The index's
//! compression and crypto tags are duplicated here so a consumer can tell
//! whether it will be able to decompress and decrypt before fetching a
//! single block. Seeds are optionally signed; the certificate covers the
//! canonical encoding with the certificate record itself excluded.

use std::hash::{Hash, Hasher};

use bytes::Bytes;

use crate::certificate::{Certificate, Keypair};
use crate::error::{FormatError, IntegrityError, ValidationError};
use crate::index::{CompressionAlgorithm, CryptoAlgorithm};
use crate::key::Key;
use crate::wire::{put_i64, put_record, put_str, put_u32, put_u64, RecordReader, CERTIFICATE_TAG};

/// Maximum name length in characters.
pub const MAX_NAME_LEN: usize = 256;

/// Maximum comment length in characters.
pub const MAX_COMMENT_LEN: usize = 1024;

/// Maximum length of a single keyword in characters.
pub const MAX_KEYWORD_LEN: usize = 256;

/// Field tags for the canonical encoding.
mod tag {
    pub const NAME: u8 = 0;
    pub const LENGTH: u8 = 1;
    pub const CREATION_TIME: u8 = 2;
    pub const KEYWORD: u8 = 3;
    pub const COMMENT: u8 = 4;
    pub const RANK: u8 = 5;
    pub const KEY: u8 = 6;
    pub const COMPRESSION: u8 = 7;
    pub const CRYPTO: u8 = 8;
    pub const CRYPTO_KEY: u8 = 9;
}

pub(crate) fn check_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::FieldTooLong { field, len, max });
    }
    Ok(())
}

/// Content metadata with an optional certificate.
///
/// Equality and the canonical signing bytes exclude the certificate, so
/// the same content signed by two publishers compares equal. The hash
/// code comes from the name alone (bucket placement, not identity).
#[derive(Debug, Clone)]
pub struct Seed {
    name: String,
    length: u64,
    creation_time: i64,
    keywords: Vec<String>,
    comment: String,
    rank: u32,
    key: Key,
    compression: CompressionAlgorithm,
    crypto: CryptoAlgorithm,
    crypto_key: Option<Bytes>,
    certificate: Option<Certificate>,
}

impl Seed {
    /// The content name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original payload length in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Publisher-claimed creation time (Unix milliseconds). Untrusted.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Search keywords.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Freeform comment.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Publisher-assigned rank.
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// The root key naming the index that reconstructs the payload.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The compression applied before chunking.
    pub fn compression(&self) -> CompressionAlgorithm {
        self.compression
    }

    /// The encryption applied before chunking.
    pub fn crypto(&self) -> CryptoAlgorithm {
        self.crypto
    }

    /// The symmetric key material, when encryption is active.
    pub fn crypto_key(&self) -> Option<&[u8]> {
        self.crypto_key.as_deref()
    }

    /// The certificate, once signed.
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// Sign this seed. One-way: a signed seed stays signed.
    pub fn create_certificate(&mut self, keypair: &Keypair) {
        let message = self.canonical_bytes_excluding_certificate();
        self.certificate = Some(Certificate::issue(&message, keypair));
    }

    /// Check the certificate against the canonical bytes.
    ///
    /// An unsigned seed fails with [`IntegrityError::MissingCertificate`].
    pub fn verify_certificate(&self) -> Result<(), IntegrityError> {
        let certificate = self
            .certificate
            .as_ref()
            .ok_or(IntegrityError::MissingCertificate)?;
        certificate.verify(&self.canonical_bytes_excluding_certificate())
    }

    /// The signing preimage: every data field, certificate excluded.
    pub fn canonical_bytes_excluding_certificate(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if !self.name.is_empty() {
            put_str(&mut buf, tag::NAME, &self.name);
        }
        if self.length != 0 {
            put_u64(&mut buf, tag::LENGTH, self.length);
        }
        if self.creation_time != 0 {
            put_i64(&mut buf, tag::CREATION_TIME, self.creation_time);
        }
        for keyword in &self.keywords {
            put_str(&mut buf, tag::KEYWORD, keyword);
        }
        if !self.comment.is_empty() {
            put_str(&mut buf, tag::COMMENT, &self.comment);
        }
        if self.rank != 0 {
            put_u32(&mut buf, tag::RANK, self.rank);
        }
        if self.key != Key::default() {
            put_record(&mut buf, tag::KEY, &self.key.to_canonical_bytes());
        }
        if self.compression != CompressionAlgorithm::default() {
            put_record(&mut buf, tag::COMPRESSION, &[self.compression.to_u8()]);
        }
        if self.crypto != CryptoAlgorithm::default() {
            put_record(&mut buf, tag::CRYPTO, &[self.crypto.to_u8()]);
        }
        if self.crypto != CryptoAlgorithm::None {
            if let Some(key) = &self.crypto_key {
                put_record(&mut buf, tag::CRYPTO_KEY, key);
            }
        }
        buf
    }

    /// Encode to canonical bytes, certificate last.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = self.canonical_bytes_excluding_certificate();
        if let Some(certificate) = &self.certificate {
            put_record(&mut buf, CERTIFICATE_TAG, &certificate.to_canonical_bytes());
        }
        buf
    }

    /// Decode from canonical bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut builder = SeedBuilder::new("");
        let mut certificate = None;

        let mut reader = RecordReader::new(bytes);
        while let Some(record) = reader.next_record()? {
            match record.tag {
                tag::NAME => builder.name = record.as_str()?.to_string(),
                tag::LENGTH => builder.length = record.as_u64()?,
                tag::CREATION_TIME => builder.creation_time = record.as_i64()?,
                tag::KEYWORD => builder.keywords.push(record.as_str()?.to_string()),
                tag::COMMENT => builder.comment = record.as_str()?.to_string(),
                tag::RANK => builder.rank = record.as_u32()?,
                tag::KEY => builder.key = Key::from_canonical_bytes(record.payload)?,
                tag::COMPRESSION => {
                    let value = record.as_u8()?;
                    builder.compression = CompressionAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "compression",
                            value,
                        },
                    )?;
                }
                tag::CRYPTO => {
                    let value = record.as_u8()?;
                    builder.crypto = CryptoAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "crypto",
                            value,
                        },
                    )?;
                }
                tag::CRYPTO_KEY => builder.crypto_key = Some(record.payload.to_vec()),
                CERTIFICATE_TAG => {
                    certificate = Some(Certificate::from_canonical_bytes(record.payload)?);
                }
                _ => {}
            }
        }

        let mut seed = builder.build()?;
        seed.certificate = certificate;
        Ok(seed)
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        // Certificate excluded: who signed does not change what is named.
        self.name == other.name
            && self.length == other.length
            && self.creation_time == other.creation_time
            && self.keywords == other.keywords
            && self.comment == other.comment
            && self.rank == other.rank
            && self.key == other.key
            && self.compression == other.compression
            && self.crypto == other.crypto
            && self.crypto_key == other.crypto_key
    }
}

impl Eq for Seed {}

impl Hash for Seed {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Builder for creating seeds.
pub struct SeedBuilder {
    name: String,
    length: u64,
    creation_time: i64,
    keywords: Vec<String>,
    comment: String,
    rank: u32,
    key: Key,
    compression: CompressionAlgorithm,
    crypto: CryptoAlgorithm,
    crypto_key: Option<Vec<u8>>,
}

impl SeedBuilder {
    /// Start building a seed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: 0,
            creation_time: 0,
            keywords: Vec::new(),
            comment: String::new(),
            rank: 0,
            key: Key::default(),
            compression: CompressionAlgorithm::None,
            crypto: CryptoAlgorithm::None,
            crypto_key: None,
        }
    }

    /// Set the original payload length.
    pub fn length(mut self, length: u64) -> Self {
        self.length = length;
        self
    }

    /// Set the creation time (Unix milliseconds).
    pub fn creation_time(mut self, ts: i64) -> Self {
        self.creation_time = ts;
        self
    }

    /// Add a search keyword.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Set the comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the rank.
    pub fn rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }

    /// Set the root key.
    pub fn key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    /// Set the compression tag.
    pub fn compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Set the crypto tag and key material together.
    pub fn crypto(mut self, crypto: CryptoAlgorithm, crypto_key: Option<Vec<u8>>) -> Self {
        self.crypto = crypto;
        self.crypto_key = crypto_key;
        self
    }

    /// Build an unsigned seed, validating field ceilings.
    pub fn build(self) -> Result<Seed, ValidationError> {
        check_text("name", &self.name, MAX_NAME_LEN)?;
        check_text("comment", &self.comment, MAX_COMMENT_LEN)?;
        for keyword in &self.keywords {
            check_text("keyword", keyword, MAX_KEYWORD_LEN)?;
        }
        match (self.crypto, &self.crypto_key) {
            (CryptoAlgorithm::None, Some(_)) => return Err(ValidationError::UnexpectedCryptoKey),
            (CryptoAlgorithm::None, None) => {}
            (_, None) => return Err(ValidationError::MissingCryptoKey),
            (_, Some(_)) => {}
        }
        Ok(Seed {
            name: self.name,
            length: self.length,
            creation_time: self.creation_time,
            keywords: self.keywords,
            comment: self.comment,
            rank: self.rank,
            key: self.key,
            compression: self.compression,
            crypto: self.crypto,
            crypto_key: self.crypto_key.map(Bytes::from),
            certificate: None,
        })
    }

    /// Build and sign in one step.
    pub fn sign(self, keypair: &Keypair) -> Result<Seed, ValidationError> {
        let mut seed = self.build()?;
        seed.create_certificate(keypair);
        Ok(seed)
    }
}
