//! Secure-boot firmware image signing.
//!
//! Prepends a fixed 32-byte header to a raw firmware binary, appends a TLV
//! trailer holding the signer's public key (or certificate), the image
//! digest and a signature, and pads the result for flashing.

pub mod crypto;
pub mod error;
pub mod format;
pub mod image;

pub use crypto::{Certificate, Key, KeyAlgorithm, SignInput, SigningMode};
pub use error::Error;
pub use format::{HashAlgorithm, ImageType, SignatureAlgorithm, TlvKind};
pub use image::{Image, ImageHeader, ImageOptions, TlvBlock, TlvBuilder, TlvRecord, TrailerPlan};

pub type Result<T> = std::result::Result<T, Error>;
