//! Image signing options

use crate::format::{HashAlgorithm, ImageType, SignatureAlgorithm, IMAGE_HEADER_SIZE};
use crate::{Error, Result};

/// Settings that shape the image header.
///
/// # Example
///
/// ```
/// use fwsign::{HashAlgorithm, ImageOptions, ImageType, SignatureAlgorithm};
///
/// let options = ImageOptions::new(ImageType::Application, 0x0102_0003)
///     .header_size(0x400)
///     .hash_algorithm(HashAlgorithm::Sha512)
///     .signature_algorithm(SignatureAlgorithm::Ed25519);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    image_type: ImageType,
    version: u32,
    header_size: u16,
    hash_algorithm: HashAlgorithm,
    signature_algorithm: SignatureAlgorithm,
    included_header: bool,
}

impl ImageOptions {
    /// Create options with a 32-byte header, SHA-256 and ECDSA-P256.
    pub fn new(image_type: ImageType, version: u32) -> Self {
        Self {
            image_type,
            version,
            header_size: IMAGE_HEADER_SIZE as u16,
            hash_algorithm: HashAlgorithm::default(),
            signature_algorithm: SignatureAlgorithm::default(),
            included_header: false,
        }
    }

    /// Set the reserved space in front of the firmware.
    ///
    /// Anything beyond 32 bytes is filled with `0xFF` ahead of the header.
    pub fn header_size(mut self, size: u16) -> Self {
        self.header_size = size;
        self
    }

    /// Set the digest algorithm.
    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Set the signature algorithm code written into the header.
    pub fn signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Whether the input file already starts with the zeroed reserved region.
    ///
    /// When false (the default) the loader prepends it.
    pub fn included_header(mut self, included: bool) -> Self {
        self.included_header = included;
        self
    }

    /// Check that the options describe a buildable image.
    pub fn validate(&self) -> Result<()> {
        if (self.header_size as usize) < IMAGE_HEADER_SIZE {
            return Err(Error::Config(format!(
                "Header size {} is smaller than the {}-byte image header",
                self.header_size, IMAGE_HEADER_SIZE
            )));
        }
        Ok(())
    }

    /// Image type code for the header.
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// Packed version word.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Reserved region in front of the firmware, in bytes.
    pub fn reserved_size(&self) -> usize {
        self.header_size as usize
    }

    /// Digest algorithm.
    pub fn hash(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Header signature algorithm.
    pub fn signature(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    /// Whether the input already carries the reserved region.
    pub fn has_included_header(&self) -> bool {
        self.included_header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ImageOptions::new(ImageType::BootManager, 7);
        assert_eq!(options.reserved_size(), 32);
        assert_eq!(options.hash(), HashAlgorithm::Sha256);
        assert_eq!(options.signature(), SignatureAlgorithm::EcdsaP256);
        assert!(!options.has_included_header());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_small_header() {
        let options = ImageOptions::new(ImageType::Application, 0).header_size(16);
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }
}
