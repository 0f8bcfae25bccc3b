//! Error types for fwsign operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure case
//! in image assembly and signing: I/O, wire-format violations, key
//! capability misuse, configuration mistakes and size overflows.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for fwsign operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Match on variants to handle specific failure cases.
///
/// # Examples
///
/// ```no_run
/// use fwsign::{Error, Image, ImageOptions, ImageType};
///
/// let options = ImageOptions::new(ImageType::Application, 0x0102_0003);
/// match Image::load("firmware.bin", options) {
///     Ok(image) => println!("loaded {} bytes", image.payload().len()),
///     Err(Error::FormatViolation(msg)) => eprintln!("bad input: {msg}"),
///     Err(Error::Io(e)) => eprintln!("IO error: {e}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Occurs when reading the raw firmware, key or certificate files, or
    /// writing the finished artifact.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input does not follow the image wire format.
    ///
    /// Raised when the reserved header region is not zero-filled, when an
    /// unknown type or algorithm code is met, or when a header or TLV block
    /// read back from bytes is malformed.
    #[error("Format violation: {0}")]
    FormatViolation(String),

    /// The operation needs private key material this key does not hold.
    ///
    /// Distinct from [`Error::Key`]: the key is valid, it just cannot do this.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Invalid or incomplete signing configuration.
    ///
    /// A required key or certificate key is missing, or an option value is
    /// out of range. Signing aborts before the payload is touched.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A size constraint was violated.
    ///
    /// `current` is the size the image has (or would have), `requested` the
    /// limit it had to fit.
    #[error("Image size (0x{current:x}) exceeds requested size 0x{requested:x}")]
    Size {
        /// Size of the assembled data in bytes
        current: usize,
        /// Target or maximum size in bytes
        requested: usize,
    },

    /// Key material could not be parsed, decrypted or is unsupported.
    #[error("Invalid key: {0}")]
    Key(String),

    /// A signature did not verify against the given public key.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// The signature primitive failed.
    #[error("Signing failed: {0}")]
    Signing(String),
}
