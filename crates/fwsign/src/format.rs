//! Image format constants and type codes
//!
//! These constants define the binary contract consumed by the boot-time
//! verifier: header magic and widths, TLV block framing, and the numeric
//! codes for image types, hash algorithms, signature algorithms and TLV
//! record kinds. All multi-byte fields are little-endian.

use crate::{Error, Result};
use std::fmt;

// =============================================================================
// Image Header
// =============================================================================

/// Image header magic
pub const IMAGE_MAGIC: u32 = 0x96f3_b83d;

/// Width of the fixed image header, checksum included
pub const IMAGE_HEADER_SIZE: usize = 32;

/// Manifest format revision written into every header
pub const MANIFEST_VERSION: u8 = 0;

/// Fill byte for unused header space and flash padding
pub const PAD_BYTE: u8 = 0xff;

// =============================================================================
// TLV Block
// =============================================================================

/// TLV block magic
pub const TLV_INFO_MAGIC: u16 = 0x6907;

/// Size of the TLV block prefix (magic + total size)
pub const TLV_INFO_SIZE: usize = 4;

/// Size of each TLV record header (type + reserved + length)
pub const TLV_HEADER_SIZE: usize = 4;

// =============================================================================
// Header Field Offsets
// =============================================================================

pub const OFF_MAGIC: usize = 0;
pub const OFF_TOTAL_SIZE: usize = 4;
pub const OFF_MANIFEST_VERSION: usize = 8;
pub const OFF_IMAGE_TYPE: usize = 9;
pub const OFF_HASH_ALGORITHM: usize = 10;
pub const OFF_SIGNATURE_ALGORITHM: usize = 11;
pub const OFF_HEADER_SIZE: usize = 12;
pub const OFF_TRAILER_SIZE: usize = 14;
pub const OFF_FIRMWARE_SIZE: usize = 16;
pub const OFF_VERSION_MAJOR: usize = 20;
pub const OFF_VERSION_MINOR: usize = 21;
pub const OFF_VERSION_REVISION: usize = 22;
pub const OFF_RESERVED: usize = 24;
pub const OFF_CHECKSUM: usize = 28;

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of image being signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Boot manager (MBL)
    BootManager,
    /// Application image
    Application,
}

impl ImageType {
    /// All image types, in code order.
    pub const ALL: [ImageType; 2] = [ImageType::BootManager, ImageType::Application];

    /// Wire code for the header's image type field.
    pub fn code(self) -> u8 {
        match self {
            ImageType::BootManager => 0x1,
            ImageType::Application => 0x2,
        }
    }

    /// Decode a header image type field.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x1 => Ok(ImageType::BootManager),
            0x2 => Ok(ImageType::Application),
            other => Err(Error::FormatViolation(format!(
                "Unknown image type code 0x{other:02x}"
            ))),
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageType::BootManager => f.write_str("MBL"),
            ImageType::Application => f.write_str("IMG"),
        }
    }
}

/// Digest algorithm protecting the header and firmware body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// All hash algorithms, in code order.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha256, HashAlgorithm::Sha512];

    /// Wire code for the header's hash algorithm field.
    pub fn code(self) -> u8 {
        match self {
            HashAlgorithm::Sha256 => 0x1,
            HashAlgorithm::Sha512 => 0x2,
        }
    }

    /// Decode a header hash algorithm field.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x1 => Ok(HashAlgorithm::Sha256),
            0x2 => Ok(HashAlgorithm::Sha512),
            other => Err(Error::FormatViolation(format!(
                "Unsupported hash algorithm code 0x{other:02x}"
            ))),
        }
    }

    /// Length in bytes of a digest produced by this algorithm.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => f.write_str("SHA256"),
            HashAlgorithm::Sha512 => f.write_str("SHA512"),
        }
    }
}

/// Signature algorithm advertised in the image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    Ed25519,
    #[default]
    EcdsaP256,
}

impl SignatureAlgorithm {
    /// All header signature algorithms, in code order.
    pub const ALL: [SignatureAlgorithm; 2] =
        [SignatureAlgorithm::Ed25519, SignatureAlgorithm::EcdsaP256];

    /// Wire code for the header's signature algorithm field.
    pub fn code(self) -> u8 {
        match self {
            SignatureAlgorithm::Ed25519 => 0x1,
            SignatureAlgorithm::EcdsaP256 => 0x2,
        }
    }

    /// Decode a header signature algorithm field.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x1 => Ok(SignatureAlgorithm::Ed25519),
            0x2 => Ok(SignatureAlgorithm::EcdsaP256),
            other => Err(Error::FormatViolation(format!(
                "Unsupported signature algorithm code 0x{other:02x}"
            ))),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureAlgorithm::Ed25519 => f.write_str("ED25519"),
            SignatureAlgorithm::EcdsaP256 => f.write_str("ECDSA256"),
        }
    }
}

/// TLV record kinds that may appear in the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlvKind {
    /// Image digest
    Digest,
    /// Public key of the certificate owner
    CertificatePublicKey,
    /// Certificate blob
    Certificate,
    /// Bare signing public key
    PublicKey,
    /// Signature over the image
    Signature,
}

impl TlvKind {
    /// Wire code for the record's type byte.
    pub fn code(self) -> u8 {
        match self {
            TlvKind::Digest => 0x01,
            TlvKind::CertificatePublicKey => 0x02,
            TlvKind::Certificate => 0x03,
            TlvKind::PublicKey => 0x04,
            TlvKind::Signature => 0x05,
        }
    }

    /// Decode a record type byte.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x01 => Ok(TlvKind::Digest),
            0x02 => Ok(TlvKind::CertificatePublicKey),
            0x03 => Ok(TlvKind::Certificate),
            0x04 => Ok(TlvKind::PublicKey),
            0x05 => Ok(TlvKind::Signature),
            other => Err(Error::FormatViolation(format!(
                "Unknown TLV type code 0x{other:02x}"
            ))),
        }
    }
}

/// Split a packed version word into `(major, minor, revision)`.
///
/// Major is bits 24..31, minor bits 16..23, revision bits 0..15.
pub fn split_version(version: u32) -> (u8, u8, u16) {
    let major = (version >> 24) as u8;
    let minor = ((version & 0x00ff_ffff) >> 16) as u8;
    let revision = (version & 0xffff) as u16;
    (major, minor, revision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_offsets_cover_fixed_width() {
        assert_eq!(OFF_CHECKSUM + 4, IMAGE_HEADER_SIZE);
        assert_eq!(OFF_RESERVED + 4, OFF_CHECKSUM);
    }

    #[test]
    fn test_tlv_kind_codes_round_trip() {
        for code in 1u8..=5 {
            assert_eq!(TlvKind::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_unknown_codes_are_format_violations() {
        assert!(matches!(TlvKind::from_code(0x06), Err(Error::FormatViolation(_))));
        assert!(matches!(HashAlgorithm::from_code(0), Err(Error::FormatViolation(_))));
        assert!(matches!(SignatureAlgorithm::from_code(3), Err(Error::FormatViolation(_))));
        assert!(matches!(ImageType::from_code(0xff), Err(Error::FormatViolation(_))));
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(HashAlgorithm::Sha256.digest_len(), 32);
        assert_eq!(HashAlgorithm::Sha512.digest_len(), 64);
    }

    #[test]
    fn test_split_version() {
        assert_eq!(split_version(0x0102_0003), (1, 2, 3));
        assert_eq!(split_version(0xffff_ffff), (0xff, 0xff, 0xffff));
        assert_eq!(split_version(0x00ab_0000), (0, 0xab, 0));
    }

    #[test]
    fn test_defaults_match_tool_defaults() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
        assert_eq!(SignatureAlgorithm::default(), SignatureAlgorithm::EcdsaP256);
    }
}
