//! SeedBox: a signed directory node over seeds and nested boxes.
//!
//! Boxes let a publisher ship a whole named tree of content under one
//! certificate. The tree is self-referential, so both encode and decode
//! thread an explicit depth counter and fail closed at the ceiling: a
//! maliciously deep tree must be rejected while it is being decoded,
//! before any signature work happens, not after.
//!
//! A box's certificate covers its canonical bytes with only its own
//! certificate record excluded. Child boxes are serialized in full,
//! certificates included, so re-signing a child breaks the parent's
//! signature.

use std::hash::{Hash, Hasher};

use crate::certificate::{Certificate, Keypair};
use crate::error::{FormatError, IntegrityError, ValidationError};
use crate::seed::{check_text, Seed, MAX_COMMENT_LEN, MAX_NAME_LEN};
use crate::wire::{put_i64, put_record, put_str, RecordReader, CERTIFICATE_TAG};

/// Maximum number of seeds in one box.
pub const MAX_SEEDS: usize = 65536;

/// Maximum number of child boxes in one box.
pub const MAX_BOXES: usize = 8192;

/// Maximum nesting depth for encode and decode.
pub const MAX_BOX_DEPTH: usize = 256;

/// Field tags for the canonical encoding.
mod tag {
    pub const NAME: u8 = 0;
    pub const CREATION_TIME: u8 = 1;
    pub const COMMENT: u8 = 2;
    pub const SEED: u8 = 3;
    pub const BOX: u8 = 4;
}

/// A directory node aggregating seeds and nested boxes.
///
/// Equality excludes certificates at every level; the hash code comes
/// from the name alone, like [`Seed`].
#[derive(Debug, Clone)]
pub struct SeedBox {
    name: String,
    creation_time: i64,
    comment: String,
    seeds: Vec<Seed>,
    boxes: Vec<SeedBox>,
    certificate: Option<Certificate>,
}

impl SeedBox {
    fn assemble(
        name: String,
        creation_time: i64,
        comment: String,
        seeds: Vec<Seed>,
        boxes: Vec<SeedBox>,
    ) -> Result<Self, ValidationError> {
        check_text("name", &name, MAX_NAME_LEN)?;
        check_text("comment", &comment, MAX_COMMENT_LEN)?;
        if seeds.len() > MAX_SEEDS {
            return Err(ValidationError::TooManySeeds {
                count: seeds.len(),
                max: MAX_SEEDS,
            });
        }
        if boxes.len() > MAX_BOXES {
            return Err(ValidationError::TooManyBoxes {
                count: boxes.len(),
                max: MAX_BOXES,
            });
        }
        Ok(Self {
            name,
            creation_time,
            comment,
            seeds,
            boxes,
            certificate: None,
        })
    }

    /// The directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publisher-claimed creation time (Unix milliseconds). Untrusted.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Freeform comment.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The seeds in this box.
    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    /// The nested boxes.
    pub fn boxes(&self) -> &[SeedBox] {
        &self.boxes
    }

    /// The certificate, once signed.
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// Sign this box. One-way: a signed box stays signed.
    ///
    /// Fails only if the tree is too deep to encode.
    pub fn create_certificate(&mut self, keypair: &Keypair) -> Result<(), FormatError> {
        let message = self.canonical_bytes_excluding_certificate()?;
        self.certificate = Some(Certificate::issue(&message, keypair));
        Ok(())
    }

    /// Check the certificate against the canonical bytes.
    ///
    /// An unsigned box fails with [`IntegrityError::MissingCertificate`].
    pub fn verify_certificate(&self) -> Result<(), IntegrityError> {
        let certificate = self
            .certificate
            .as_ref()
            .ok_or(IntegrityError::MissingCertificate)?;
        let message = self.canonical_bytes_excluding_certificate()?;
        certificate.verify(&message)
    }

    /// The signing preimage: every data field including child boxes'
    /// certificates, only this box's own certificate excluded.
    pub fn canonical_bytes_excluding_certificate(&self) -> Result<Vec<u8>, FormatError> {
        self.body_at_depth(0)
    }

    /// Encode to canonical bytes, certificate last.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, FormatError> {
        self.encode_at_depth(0)
    }

    fn encode_at_depth(&self, depth: usize) -> Result<Vec<u8>, FormatError> {
        let mut buf = self.body_at_depth(depth)?;
        if let Some(certificate) = &self.certificate {
            put_record(&mut buf, CERTIFICATE_TAG, &certificate.to_canonical_bytes());
        }
        Ok(buf)
    }

    fn body_at_depth(&self, depth: usize) -> Result<Vec<u8>, FormatError> {
        if depth >= MAX_BOX_DEPTH {
            return Err(FormatError::DepthExceeded {
                limit: MAX_BOX_DEPTH,
            });
        }

        let mut buf = Vec::new();
        if !self.name.is_empty() {
            put_str(&mut buf, tag::NAME, &self.name);
        }
        if self.creation_time != 0 {
            put_i64(&mut buf, tag::CREATION_TIME, self.creation_time);
        }
        if !self.comment.is_empty() {
            put_str(&mut buf, tag::COMMENT, &self.comment);
        }
        for seed in &self.seeds {
            put_record(&mut buf, tag::SEED, &seed.to_canonical_bytes());
        }
        for child in &self.boxes {
            put_record(&mut buf, tag::BOX, &child.encode_at_depth(depth + 1)?);
        }
        Ok(buf)
    }

    /// Decode from canonical bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::decode_at_depth(bytes, 0)
    }

    fn decode_at_depth(bytes: &[u8], depth: usize) -> Result<Self, FormatError> {
        if depth >= MAX_BOX_DEPTH {
            return Err(FormatError::DepthExceeded {
                limit: MAX_BOX_DEPTH,
            });
        }

        let mut name = String::new();
        let mut creation_time = 0i64;
        let mut comment = String::new();
        let mut seeds = Vec::new();
        let mut boxes = Vec::new();
        let mut certificate = None;

        let mut reader = RecordReader::new(bytes);
        while let Some(record) = reader.next_record()? {
            match record.tag {
                tag::NAME => name = record.as_str()?.to_string(),
                tag::CREATION_TIME => creation_time = record.as_i64()?,
                tag::COMMENT => comment = record.as_str()?.to_string(),
                tag::SEED => {
                    // Ceilings are enforced while reading so a hostile
                    // stream is cut off early, not after buffering.
                    if seeds.len() >= MAX_SEEDS {
                        return Err(ValidationError::TooManySeeds {
                            count: seeds.len() + 1,
                            max: MAX_SEEDS,
                        }
                        .into());
                    }
                    seeds.push(Seed::from_canonical_bytes(record.payload)?);
                }
                tag::BOX => {
                    if boxes.len() >= MAX_BOXES {
                        return Err(ValidationError::TooManyBoxes {
                            count: boxes.len() + 1,
                            max: MAX_BOXES,
                        }
                        .into());
                    }
                    boxes.push(Self::decode_at_depth(record.payload, depth + 1)?);
                }
                CERTIFICATE_TAG => {
                    certificate = Some(Certificate::from_canonical_bytes(record.payload)?);
                }
                _ => {}
            }
        }

        let mut seed_box = Self::assemble(name, creation_time, comment, seeds, boxes)?;
        seed_box.certificate = certificate;
        Ok(seed_box)
    }
}

impl PartialEq for SeedBox {
    fn eq(&self, other: &Self) -> bool {
        // Certificates excluded at every level: seed and box comparisons
        // below recurse through certificate-excluding equality.
        self.name == other.name
            && self.creation_time == other.creation_time
            && self.comment == other.comment
            && self.seeds == other.seeds
            && self.boxes == other.boxes
    }
}

impl Eq for SeedBox {}

impl Hash for SeedBox {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Builder for creating boxes.
pub struct SeedBoxBuilder {
    name: String,
    creation_time: i64,
    comment: String,
    seeds: Vec<Seed>,
    boxes: Vec<SeedBox>,
}

impl SeedBoxBuilder {
    /// Start building a box.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_time: 0,
            comment: String::new(),
            seeds: Vec::new(),
            boxes: Vec::new(),
        }
    }

    /// Set the creation time (Unix milliseconds).
    pub fn creation_time(mut self, ts: i64) -> Self {
        self.creation_time = ts;
        self
    }

    /// Set the comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Add a seed.
    pub fn add_seed(mut self, seed: Seed) -> Self {
        self.seeds.push(seed);
        self
    }

    /// Add a nested box.
    pub fn add_box(mut self, seed_box: SeedBox) -> Self {
        self.boxes.push(seed_box);
        self
    }

    /// Build an unsigned box, validating ceilings.
    pub fn build(self) -> Result<SeedBox, ValidationError> {
        SeedBox::assemble(
            self.name,
            self.creation_time,
            self.comment,
            self.seeds,
            self.boxes,
        )
    }

    /// Build and sign in one step.
    pub fn sign(self, keypair: &Keypair) -> Result<SeedBox, FormatError> {
        let mut seed_box = self.build()?;
        seed_box.create_certificate(keypair)?;
        Ok(seed_box)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::seed::SeedBuilder;
    use std::collections::hash_map::DefaultHasher;

    fn sample_seed(name: &str) -> Seed {
        SeedBuilder::new(name)
            .length(1000)
            .key(Key::for_content(name.as_bytes()))
            .build()
            .unwrap()
    }

    /// A chain of `depth` boxes, the named one outermost.
    fn chain(depth: usize) -> SeedBox {
        let mut current = SeedBoxBuilder::new("leaf").build().unwrap();
        for _ in 1..depth {
            current = SeedBoxBuilder::new("node").add_box(current).build().unwrap();
        }
        current
    }

    #[test]
    fn test_encode_depth_ceiling() {
        assert!(chain(256).to_canonical_bytes().is_ok());
        assert!(matches!(
            chain(257).to_canonical_bytes(),
            Err(FormatError::DepthExceeded { limit: 256 })
        ));
    }

    #[test]
    fn test_decode_depth_ceiling() {
        // Hand-built nesting: each wrap adds one level above the previous.
        let encode_chain = |levels: usize| {
            let mut bytes = Vec::new();
            for _ in 1..levels {
                let mut outer = Vec::new();
                put_record(&mut outer, 4, &bytes);
                bytes = outer;
            }
            bytes
        };

        assert!(SeedBox::from_canonical_bytes(&encode_chain(256)).is_ok());
        assert!(matches!(
            SeedBox::from_canonical_bytes(&encode_chain(257)),
            Err(FormatError::DepthExceeded { limit: 256 })
        ));
    }

    #[test]
    fn test_seed_ceiling() {
        let seed = sample_seed("s");
        let mut builder = SeedBoxBuilder::new("big");
        for _ in 0..MAX_SEEDS {
            builder = builder.add_seed(seed.clone());
        }
        let over = builder.add_seed(seed);
        assert!(matches!(
            over.build(),
            Err(ValidationError::TooManySeeds { count: 65537, max: 65536 })
        ));
    }

    #[test]
    fn test_box_ceiling_cuts_off_decode() {
        let mut bytes = Vec::new();
        for _ in 0..(MAX_BOXES + 1) {
            put_record(&mut bytes, 4, &[]);
        }
        assert!(matches!(
            SeedBox::from_canonical_bytes(&bytes),
            Err(FormatError::Validation(ValidationError::TooManyBoxes { .. }))
        ));
    }

    #[test]
    fn test_sign_then_verify() {
        let keypair = Keypair::generate();
        let seed_box = SeedBoxBuilder::new("library")
            .creation_time(1736870400000)
            .comment("shared shelf")
            .add_seed(sample_seed("a"))
            .add_seed(sample_seed("b"))
            .sign(&keypair)
            .unwrap();

        seed_box.verify_certificate().unwrap();
    }

    #[test]
    fn test_unsigned_verify_reports_missing() {
        let seed_box = SeedBoxBuilder::new("x").build().unwrap();
        assert!(matches!(
            seed_box.verify_certificate(),
            Err(IntegrityError::MissingCertificate)
        ));
    }

    #[test]
    fn test_single_byte_tamper_breaks_signature() {
        let keypair = Keypair::generate();
        let seed_box = SeedBoxBuilder::new("data").sign(&keypair).unwrap();
        let mut bytes = seed_box.to_canonical_bytes().unwrap();

        // First record is the name; corrupt one payload byte so the
        // stream still parses but the signed bytes changed.
        bytes[5] ^= 0x01;
        let tampered = SeedBox::from_canonical_bytes(&bytes).unwrap();
        assert!(matches!(
            tampered.verify_certificate(),
            Err(IntegrityError::BadSignature)
        ));
    }

    #[test]
    fn test_child_certificates_are_signed_by_parent() {
        let parent_key = Keypair::from_seed(&[1; 32]);
        let child_key = Keypair::from_seed(&[2; 32]);
        let other_key = Keypair::from_seed(&[3; 32]);

        let child = SeedBoxBuilder::new("child").sign(&child_key).unwrap();
        let mut parent = SeedBoxBuilder::new("parent")
            .add_box(child)
            .sign(&parent_key)
            .unwrap();

        parent.verify_certificate().unwrap();
        parent.boxes[0].verify_certificate().unwrap();

        // Re-signing the child changes bytes the parent signed over.
        parent.boxes[0].create_certificate(&other_key).unwrap();
        parent.boxes[0].verify_certificate().unwrap();
        assert!(matches!(
            parent.verify_certificate(),
            Err(IntegrityError::BadSignature)
        ));
    }

    #[test]
    fn test_equality_excludes_certificates_recursively() {
        let make = |kp: &Keypair| {
            let child = SeedBoxBuilder::new("child").sign(kp).unwrap();
            SeedBoxBuilder::new("parent")
                .add_seed(sample_seed("s"))
                .add_box(child)
                .sign(kp)
                .unwrap()
        };

        let a = make(&Keypair::from_seed(&[4; 32]));
        let b = make(&Keypair::from_seed(&[5; 32]));
        assert_eq!(a, b);
        assert_ne!(
            a.to_canonical_bytes().unwrap(),
            b.to_canonical_bytes().unwrap()
        );
    }

    #[test]
    fn test_hash_code_from_name_only() {
        let hash_of = |b: &SeedBox| {
            let mut hasher = DefaultHasher::new();
            b.hash(&mut hasher);
            hasher.finish()
        };

        let a = SeedBoxBuilder::new("same").build().unwrap();
        let b = SeedBoxBuilder::new("same")
            .add_seed(sample_seed("s"))
            .build()
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_canonical_roundtrip_full_tree() {
        let keypair = Keypair::from_seed(&[9; 32]);
        let child = SeedBoxBuilder::new("movies")
            .add_seed(sample_seed("video.mp4"))
            .sign(&keypair)
            .unwrap();
        let root = SeedBoxBuilder::new("library")
            .creation_time(1736870400000)
            .comment("main share")
            .add_seed(sample_seed("readme.txt"))
            .add_box(child)
            .sign(&keypair)
            .unwrap();

        let bytes = root.to_canonical_bytes().unwrap();
        let decoded = SeedBox::from_canonical_bytes(&bytes).unwrap();

        assert_eq!(root, decoded);
        assert_eq!(decoded.certificate(), root.certificate());
        decoded.verify_certificate().unwrap();
        decoded.boxes()[0].verify_certificate().unwrap();
        assert_eq!(decoded.boxes()[0].seeds()[0].name(), "video.mp4");
    }

    #[test]
    fn test_unknown_field_tag_skipped() {
        let seed_box = SeedBoxBuilder::new("x").add_seed(sample_seed("s")).build().unwrap();
        let mut bytes = seed_box.to_canonical_bytes().unwrap();
        put_record(&mut bytes, 0x22, b"later schema");
        assert_eq!(SeedBox::from_canonical_bytes(&bytes).unwrap(), seed_box);
    }
}
