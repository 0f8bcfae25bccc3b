//! Fixed-width image header
//!
//! The header is 32 bytes, little-endian, and ends with a checksum word:
//!
//! ```text
//! 0   magic            u32
//! 4   total size       u32   header + firmware + trailer
//! 8   manifest version u8
//! 9   image type       u8
//! 10  hash algorithm   u8
//! 11  sig algorithm    u8
//! 12  header size      u16
//! 14  trailer size     u16
//! 16  firmware size    u32
//! 20  major            u8
//! 21  minor            u8
//! 22  revision         u16
//! 24  reserved         u32
//! 28  checksum         u32   XOR of the seven words above
//! ```

use crate::format::*;
use crate::{Error, Result};

/// Decoded image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Header + firmware + trailer, in bytes
    pub total_size: u32,
    /// Manifest format revision
    pub manifest_version: u8,
    pub image_type: ImageType,
    pub hash_algorithm: HashAlgorithm,
    pub signature_algorithm: SignatureAlgorithm,
    /// Width of the header as recorded in the header itself
    pub header_size: u16,
    /// Size of the TLV block that follows the firmware
    pub trailer_size: u16,
    /// Firmware body size, header and trailer excluded
    pub firmware_size: u32,
    pub major: u8,
    pub minor: u8,
    pub revision: u16,
    pub reserved: u32,
}

impl ImageHeader {
    /// Serialize the header, checksum included.
    pub fn to_bytes(&self) -> [u8; IMAGE_HEADER_SIZE] {
        let mut buf = [0u8; IMAGE_HEADER_SIZE];

        buf[OFF_MAGIC..OFF_MAGIC + 4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
        buf[OFF_TOTAL_SIZE..OFF_TOTAL_SIZE + 4].copy_from_slice(&self.total_size.to_le_bytes());
        buf[OFF_MANIFEST_VERSION] = self.manifest_version;
        buf[OFF_IMAGE_TYPE] = self.image_type.code();
        buf[OFF_HASH_ALGORITHM] = self.hash_algorithm.code();
        buf[OFF_SIGNATURE_ALGORITHM] = self.signature_algorithm.code();
        buf[OFF_HEADER_SIZE..OFF_HEADER_SIZE + 2].copy_from_slice(&self.header_size.to_le_bytes());
        buf[OFF_TRAILER_SIZE..OFF_TRAILER_SIZE + 2]
            .copy_from_slice(&self.trailer_size.to_le_bytes());
        buf[OFF_FIRMWARE_SIZE..OFF_FIRMWARE_SIZE + 4]
            .copy_from_slice(&self.firmware_size.to_le_bytes());
        buf[OFF_VERSION_MAJOR] = self.major;
        buf[OFF_VERSION_MINOR] = self.minor;
        buf[OFF_VERSION_REVISION..OFF_VERSION_REVISION + 2]
            .copy_from_slice(&self.revision.to_le_bytes());
        buf[OFF_RESERVED..OFF_RESERVED + 4].copy_from_slice(&self.reserved.to_le_bytes());

        let sum = checksum(&buf[..OFF_CHECKSUM]);
        buf[OFF_CHECKSUM..].copy_from_slice(&sum.to_le_bytes());

        buf
    }

    /// Decode and validate a header from the first 32 bytes of `data`.
    ///
    /// Checks the magic, the checksum and every type code.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < IMAGE_HEADER_SIZE {
            return Err(Error::FormatViolation(format!(
                "header truncated: {} bytes, need {}",
                data.len(),
                IMAGE_HEADER_SIZE
            )));
        }

        let magic = read_u32(data, OFF_MAGIC);
        if magic != IMAGE_MAGIC {
            return Err(Error::FormatViolation(format!(
                "Bad header magic 0x{magic:08x}, expected 0x{IMAGE_MAGIC:08x}"
            )));
        }

        let stored = read_u32(data, OFF_CHECKSUM);
        let computed = checksum(&data[..OFF_CHECKSUM]);
        if stored != computed {
            return Err(Error::FormatViolation(format!(
                "Header checksum mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}"
            )));
        }

        Ok(Self {
            total_size: read_u32(data, OFF_TOTAL_SIZE),
            manifest_version: data[OFF_MANIFEST_VERSION],
            image_type: ImageType::from_code(data[OFF_IMAGE_TYPE])?,
            hash_algorithm: HashAlgorithm::from_code(data[OFF_HASH_ALGORITHM])?,
            signature_algorithm: SignatureAlgorithm::from_code(data[OFF_SIGNATURE_ALGORITHM])?,
            header_size: read_u16(data, OFF_HEADER_SIZE),
            trailer_size: read_u16(data, OFF_TRAILER_SIZE),
            firmware_size: read_u32(data, OFF_FIRMWARE_SIZE),
            major: data[OFF_VERSION_MAJOR],
            minor: data[OFF_VERSION_MINOR],
            revision: read_u16(data, OFF_VERSION_REVISION),
            reserved: read_u32(data, OFF_RESERVED),
        })
    }

    /// Version packed back into a single word.
    pub fn version(&self) -> u32 {
        (self.major as u32) << 24 | (self.minor as u32) << 16 | self.revision as u32
    }
}

/// XOR of the little-endian 32-bit words in `data`.
///
/// A trailing partial word is ignored; header callers always pass 28 bytes.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .fold(0, |acc, w| acc ^ w)
}

fn read_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

fn read_u16(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([data[off], data[off + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImageHeader {
        ImageHeader {
            total_size: 276,
            manifest_version: MANIFEST_VERSION,
            image_type: ImageType::Application,
            hash_algorithm: HashAlgorithm::Sha256,
            signature_algorithm: SignatureAlgorithm::Ed25519,
            header_size: IMAGE_HEADER_SIZE as u16,
            trailer_size: 144,
            firmware_size: 100,
            major: 1,
            minor: 2,
            revision: 3,
            reserved: 0,
        }
    }

    #[test]
    fn test_field_layout() {
        let bytes = sample().to_bytes();

        assert_eq!(&bytes[0..4], &[0x3d, 0xb8, 0xf3, 0x96]);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 276);
        assert_eq!(bytes[8], 0);
        assert_eq!(bytes[9], 0x02);
        assert_eq!(bytes[10], 0x01);
        assert_eq!(bytes[11], 0x01);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), 32);
        assert_eq!(u16::from_le_bytes([bytes[14], bytes[15]]), 144);
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 100);
        assert_eq!(bytes[20], 1);
        assert_eq!(bytes[21], 2);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 3);
        assert_eq!(&bytes[24..28], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_checksum_is_xor_of_words() {
        let bytes = sample().to_bytes();
        let mut expected = 0u32;
        for i in 0..7 {
            expected ^= u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
        }
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), expected);
    }

    #[test]
    fn test_checksum_detects_any_single_bit_flip() {
        let bytes = sample().to_bytes();
        let clean = checksum(&bytes[..OFF_CHECKSUM]);
        for byte in 0..OFF_CHECKSUM {
            for bit in 0..8 {
                let mut flipped = bytes;
                flipped[byte] ^= 1 << bit;
                assert_ne!(checksum(&flipped[..OFF_CHECKSUM]), clean);
            }
        }
    }

    #[test]
    fn test_parse_round_trip() {
        let header = sample();
        let parsed = ImageHeader::parse(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.version(), 0x0102_0003);
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let mut bytes = sample().to_bytes();
        bytes[16] ^= 0x01;
        assert!(matches!(ImageHeader::parse(&bytes), Err(Error::FormatViolation(_))));

        let mut bytes = sample().to_bytes();
        bytes[0] = 0;
        assert!(matches!(ImageHeader::parse(&bytes), Err(Error::FormatViolation(_))));

        assert!(matches!(
            ImageHeader::parse(&[0u8; 16]),
            Err(Error::FormatViolation(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_codes_with_valid_checksum() {
        let mut bytes = sample().to_bytes();
        bytes[OFF_HASH_ALGORITHM] = 0x07;
        let sum = checksum(&bytes[..OFF_CHECKSUM]);
        bytes[OFF_CHECKSUM..].copy_from_slice(&sum.to_le_bytes());
        assert!(matches!(ImageHeader::parse(&bytes), Err(Error::FormatViolation(_))));
    }
}
