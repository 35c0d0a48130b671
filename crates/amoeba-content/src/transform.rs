//! Whole-payload transforms applied before chunking.
//!
//! Compression runs first and encryption second, so the cipher sees
//! already-compressed input. [`revert`] applies the inverses in the
//! opposite order.

use std::fmt;
use std::io::{Read, Write};

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use rand::RngCore;

use amoeba_core::{CompressionAlgorithm, CryptoAlgorithm, ValidationError};

use crate::error::{ContentError, Result};

/// Symmetric key and nonce for one encrypted payload.
///
/// Each payload gets fresh material, so the nonce is bound to the key and
/// both travel together in an index's `crypto_key` field.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentSecret {
    key: [u8; 32],
    nonce: [u8; 12],
}

impl ContentSecret {
    /// Serialized length: 32 key bytes followed by 12 nonce bytes.
    pub const LEN: usize = 44;

    /// Generates fresh random key material.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        let mut nonce = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut key);
        rand::thread_rng().fill_bytes(&mut nonce);
        Self { key, nonce }
    }

    /// Parses material previously produced by [`ContentSecret::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(ContentError::InvalidCryptoKey {
                len: bytes.len(),
                expected: Self::LEN,
            });
        }
        let mut key = [0u8; 32];
        let mut nonce = [0u8; 12];
        key.copy_from_slice(&bytes[..32]);
        nonce.copy_from_slice(&bytes[32..]);
        Ok(Self { key, nonce })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.nonce);
        out
    }

    /// Encrypts and authenticates `plaintext` with ChaCha20-Poly1305.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| ContentError::Crypto(e.to_string()))?;
        let nonce = Nonce::from_slice(&self.nonce);
        cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| ContentError::Crypto(e.to_string()))
    }

    /// Decrypts `ciphertext`, failing if the authentication tag does not
    /// check out.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| ContentError::Crypto(e.to_string()))?;
        let nonce = Nonce::from_slice(&self.nonce);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| ContentError::Crypto(e.to_string()))
    }
}

impl fmt::Debug for ContentSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentSecret(..)")
    }
}

/// Runs the forward transform: compress, then encrypt.
///
/// A secret is required exactly when `crypto` is active.
pub fn apply(
    payload: &[u8],
    compression: CompressionAlgorithm,
    crypto: CryptoAlgorithm,
    secret: Option<&ContentSecret>,
) -> Result<Vec<u8>> {
    let compressed = compress(payload, compression)?;
    match crypto {
        CryptoAlgorithm::None => Ok(compressed),
        CryptoAlgorithm::ChaCha20Poly1305 => {
            let secret = secret.ok_or(ValidationError::MissingCryptoKey)?;
            secret.encrypt(&compressed)
        }
    }
}

/// Runs the inverse transform: decrypt, then decompress.
pub fn revert(
    bytes: &[u8],
    compression: CompressionAlgorithm,
    crypto: CryptoAlgorithm,
    secret: Option<&ContentSecret>,
) -> Result<Vec<u8>> {
    let decrypted = match crypto {
        CryptoAlgorithm::None => bytes.to_vec(),
        CryptoAlgorithm::ChaCha20Poly1305 => {
            let secret = secret.ok_or(ValidationError::MissingCryptoKey)?;
            secret.decrypt(bytes)?
        }
    };
    decompress(&decrypted, compression)
}

fn compress(payload: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        CompressionAlgorithm::None => Ok(payload.to_vec()),
        CompressionAlgorithm::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(payload)?;
            Ok(encoder.finish()?)
        }
    }
}

fn decompress(bytes: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        CompressionAlgorithm::None => Ok(bytes.to_vec()),
        CompressionAlgorithm::Deflate => {
            let mut decoder = DeflateDecoder::new(bytes);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_bytes_roundtrip() {
        let secret = ContentSecret::generate();
        let bytes = secret.to_bytes();
        assert_eq!(bytes.len(), ContentSecret::LEN);
        assert_eq!(ContentSecret::from_bytes(&bytes).unwrap(), secret);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        let err = ContentSecret::from_bytes(&[0u8; 43]).unwrap_err();
        assert!(matches!(
            err,
            ContentError::InvalidCryptoKey { len: 43, expected: 44 }
        ));
        assert!(ContentSecret::from_bytes(&[0u8; 45]).is_err());
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let secret = ContentSecret::generate();
        let ciphertext = secret.encrypt(b"attack at dawn").unwrap();
        assert_ne!(&ciphertext, b"attack at dawn");
        assert_eq!(secret.decrypt(&ciphertext).unwrap(), b"attack at dawn");
    }

    #[test]
    fn test_decrypt_rejects_tampered_ciphertext() {
        let secret = ContentSecret::generate();
        let mut ciphertext = secret.encrypt(b"attack at dawn").unwrap();
        ciphertext[3] ^= 0x01;
        assert!(matches!(
            secret.decrypt(&ciphertext),
            Err(ContentError::Crypto(_))
        ));
    }

    #[test]
    fn test_decrypt_with_wrong_secret_fails() {
        let ciphertext = ContentSecret::generate().encrypt(b"payload").unwrap();
        assert!(ContentSecret::generate().decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_deflate_shrinks_repetitive_input() {
        let payload = vec![7u8; 4096];
        let compressed = compress(&payload, CompressionAlgorithm::Deflate).unwrap();
        assert!(compressed.len() < payload.len());
        assert_eq!(
            decompress(&compressed, CompressionAlgorithm::Deflate).unwrap(),
            payload
        );
    }

    #[test]
    fn test_apply_revert_identity_all_combinations() {
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let combos = [
            (CompressionAlgorithm::None, CryptoAlgorithm::None),
            (CompressionAlgorithm::Deflate, CryptoAlgorithm::None),
            (CompressionAlgorithm::None, CryptoAlgorithm::ChaCha20Poly1305),
            (
                CompressionAlgorithm::Deflate,
                CryptoAlgorithm::ChaCha20Poly1305,
            ),
        ];
        for (compression, crypto) in combos {
            let secret = match crypto {
                CryptoAlgorithm::None => None,
                CryptoAlgorithm::ChaCha20Poly1305 => Some(ContentSecret::generate()),
            };
            let transformed = apply(&payload, compression, crypto, secret.as_ref()).unwrap();
            let restored = revert(&transformed, compression, crypto, secret.as_ref()).unwrap();
            assert_eq!(restored, payload, "{compression:?}/{crypto:?}");
        }
    }

    #[test]
    fn test_active_crypto_requires_secret() {
        let err = apply(
            b"payload",
            CompressionAlgorithm::None,
            CryptoAlgorithm::ChaCha20Poly1305,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ContentError::Validation(ValidationError::MissingCryptoKey)
        ));
    }
}
