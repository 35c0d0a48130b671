//! Certificates: detached signatures over canonical entity encodings.
//!
//! A certificate proves authorship of a `Seed` or `SeedBox`. It is a plain
//! signature bundle (algorithm tag, public key, signature bytes), not a PKI
//! chain. The signed message is always the entity's canonical encoding with
//! the certificate record itself excluded.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{FormatError, IntegrityError};
use crate::wire::{put_record, RecordReader};

/// Field tags for the canonical encoding.
mod tag {
    pub const ALGORITHM: u8 = 0;
    pub const PUBLIC_KEY: u8 = 1;
    pub const SIGNATURE: u8 = 2;
}

/// The signature algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SignatureAlgorithm {
    /// Ed25519, 32-byte public key, 64-byte signature.
    #[default]
    Ed25519 = 0,
}

impl SignatureAlgorithm {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ed25519),
            _ => None,
        }
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Verify a signature over a message.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Ed25519Signature,
    ) -> Result<(), IntegrityError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| IntegrityError::MalformedPublicKey)?;

        let sig = Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| IntegrityError::BadSignature)
    }

    /// The zero public key (placeholder for an unset field).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Ed25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The zero signature (invalid, used as placeholder).
    pub const ZERO: Self = Self([0u8; 64]);
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Ed25519Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

/// A keypair for issuing certificates.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// A signature bundle attached to a signed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub algorithm: SignatureAlgorithm,
    pub public_key: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

impl Certificate {
    /// Sign `message` and bundle the result with the signer's public key.
    pub fn issue(message: &[u8], keypair: &Keypair) -> Self {
        Self {
            algorithm: SignatureAlgorithm::Ed25519,
            public_key: keypair.public_key(),
            signature: keypair.sign(message),
        }
    }

    /// Check this certificate against `message`.
    pub fn verify(&self, message: &[u8]) -> Result<(), IntegrityError> {
        match self.algorithm {
            SignatureAlgorithm::Ed25519 => self.public_key.verify(message, &self.signature),
        }
    }

    /// Encode to canonical bytes.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if self.algorithm != SignatureAlgorithm::default() {
            put_record(&mut buf, tag::ALGORITHM, &[self.algorithm.to_u8()]);
        }
        if self.public_key != Ed25519PublicKey::ZERO {
            put_record(&mut buf, tag::PUBLIC_KEY, &self.public_key.0);
        }
        if self.signature != Ed25519Signature::ZERO {
            put_record(&mut buf, tag::SIGNATURE, &self.signature.0);
        }
        buf
    }

    /// Decode from canonical bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut algorithm = SignatureAlgorithm::default();
        let mut public_key = Ed25519PublicKey::ZERO;
        let mut signature = Ed25519Signature::ZERO;

        let mut reader = RecordReader::new(bytes);
        while let Some(record) = reader.next_record()? {
            match record.tag {
                tag::ALGORITHM => {
                    let value = record.as_u8()?;
                    algorithm = SignatureAlgorithm::from_u8(value).ok_or(
                        FormatError::UnknownAlgorithm {
                            family: "signature",
                            value,
                        },
                    )?;
                }
                tag::PUBLIC_KEY => {
                    if record.payload.len() != 32 {
                        return Err(FormatError::BadFieldWidth {
                            tag: record.tag,
                            len: record.payload.len(),
                            expected: 32,
                        });
                    }
                    let mut arr = [0u8; 32];
                    arr.copy_from_slice(record.payload);
                    public_key = Ed25519PublicKey(arr);
                }
                tag::SIGNATURE => {
                    if record.payload.len() != 64 {
                        return Err(FormatError::BadFieldWidth {
                            tag: record.tag,
                            len: record.payload.len(),
                            expected: 64,
                        });
                    }
                    let mut arr = [0u8; 64];
                    arr.copy_from_slice(record.payload);
                    signature = Ed25519Signature(arr);
                }
                _ => {}
            }
        }

        Ok(Self {
            algorithm,
            public_key,
            signature,
        })
    }
}
