//! Image assembly and signing
//!
//! An [`Image`] owns the payload buffer for one signing run. It starts as a
//! zeroed reserved region followed by the raw firmware and ends as
//!
//! ```text
//! [0xFF fill][32-byte header][firmware][TLV trailer][0xFF padding]
//! ```
//!
//! Signing is two-phase. [`Image::plan_trailer`] settles the trust records
//! and the exact trailer size, which the header must carry, and
//! [`Image::commit`] writes header and trailer. Every fallible step of the
//! commit runs before the payload is touched.

pub mod header;
pub mod options;
pub mod tlv;

pub use header::ImageHeader;
pub use options::ImageOptions;
pub use tlv::{TlvBlock, TlvBuilder, TlvRecord};

use crate::crypto::{compute_digest, Certificate, Key, KeyAlgorithm, SignInput, SigningMode};
use crate::format::{
    split_version, TlvKind, IMAGE_HEADER_SIZE, MANIFEST_VERSION, PAD_BYTE, TLV_INFO_SIZE,
};
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tlv::record_size;

/// Alignments accepted by [`Image::pad_to`]
const PAD_ALIGNMENTS: [usize; 4] = [1, 2, 4, 8];

/// Trailer layout settled before the header is written.
///
/// Produced by [`Image::plan_trailer`] and consumed by [`Image::commit`].
#[derive(Debug, Clone)]
pub struct TrailerPlan {
    /// Records identifying the signer, in trailer order
    trust: Vec<(TlvKind, Vec<u8>)>,
    key_algorithm: KeyAlgorithm,
    digest_len: usize,
    signature_len: usize,
    size: usize,
}

impl TrailerPlan {
    /// Exact size of the TLV block, block header included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the trailer carries a certificate instead of a bare key.
    pub fn uses_certificate(&self) -> bool {
        self.trust
            .iter()
            .any(|(kind, _)| *kind == TlvKind::Certificate)
    }

    /// Record kinds in the order they will be written.
    pub fn kinds(&self) -> Vec<TlvKind> {
        self.trust
            .iter()
            .map(|(kind, _)| *kind)
            .chain([TlvKind::Digest, TlvKind::Signature])
            .collect()
    }
}

/// A firmware image being signed.
///
/// # Example
///
/// ```no_run
/// use fwsign::{Image, ImageOptions, ImageType, Key};
///
/// let key = Key::load("signing.pem", None)?;
/// let options = ImageOptions::new(ImageType::Application, 0x0102_0003);
///
/// let mut image = Image::load("app.bin", options)?;
/// image.sign(Some(&key), None, None)?;
/// image.pad_to(0x20000, 4)?;
/// image.save("app-signed.bin")?;
/// # Ok::<(), fwsign::Error>(())
/// ```
#[derive(Debug)]
pub struct Image {
    payload: Vec<u8>,
    options: ImageOptions,
    firmware_len: usize,
    signed: bool,
}

impl Image {
    /// Read a raw firmware file.
    ///
    /// Unless the options say the file already includes it, a zeroed
    /// reserved region of `header_size` bytes is prepended.
    pub fn load(path: impl AsRef<Path>, options: ImageOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        tracing::debug!(path = %path.display(), len = data.len(), "read firmware");
        Self::from_bytes(data, options)
    }

    /// Build an image from firmware bytes already in memory.
    ///
    /// Fails with [`Error::FormatViolation`] if any byte of the reserved
    /// region is non-zero.
    pub fn from_bytes(data: Vec<u8>, options: ImageOptions) -> Result<Self> {
        options.validate()?;
        let reserved = options.reserved_size();

        let payload = if options.has_included_header() {
            data
        } else {
            let mut payload = vec![0u8; reserved];
            payload.extend(data);
            payload
        };

        if payload.len() < reserved {
            return Err(Error::FormatViolation(format!(
                "Image is {} bytes, shorter than the {}-byte header region",
                payload.len(),
                reserved
            )));
        }
        check_reserved_zero(&payload[..reserved])?;

        Ok(Self {
            firmware_len: payload.len() - reserved,
            payload,
            options,
            signed: false,
        })
    }

    /// Current payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Options the image was loaded with.
    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    /// Size of the firmware body, reserved region excluded.
    pub fn firmware_len(&self) -> usize {
        self.firmware_len
    }

    /// Whether header and trailer have been written.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Sign the image in one call.
    ///
    /// `key` signs the digest. With a `certificate`, the trailer carries the
    /// certificate and the public half of `certificate_key` instead of the
    /// public half of `key`.
    pub fn sign(
        &mut self,
        key: Option<&Key>,
        certificate: Option<&Certificate>,
        certificate_key: Option<&Key>,
    ) -> Result<()> {
        let plan = self.plan_trailer(key, certificate, certificate_key)?;
        let key = key.ok_or_else(|| Error::Config("No signing key given".into()))?;
        self.commit(&plan, key)
    }

    /// Work out the trailer layout and size without touching the payload.
    pub fn plan_trailer(
        &self,
        key: Option<&Key>,
        certificate: Option<&Certificate>,
        certificate_key: Option<&Key>,
    ) -> Result<TrailerPlan> {
        if self.signed {
            return Err(Error::Config(
                "Image is already signed; load a fresh copy to sign again".into(),
            ));
        }
        check_reserved_zero(&self.payload[..self.options.reserved_size()])?;

        let key = key.ok_or_else(|| Error::Config("No signing key given".into()))?;

        let trust = match certificate {
            Some(certificate) => {
                let certificate_key = certificate_key.ok_or_else(|| {
                    Error::Config("A certificate requires its certificate key".into())
                })?;
                vec![
                    (TlvKind::CertificatePublicKey, certificate_key.public_bytes()?),
                    (TlvKind::Certificate, certificate.as_bytes().to_vec()),
                ]
            }
            None => vec![(TlvKind::PublicKey, key.public_bytes()?)],
        };

        let digest_len = self.options.hash().digest_len();
        let signature_len = key.signature_len();

        let size = TLV_INFO_SIZE
            + trust
                .iter()
                .map(|(_, value)| record_size(value.len()))
                .sum::<usize>()
            + record_size(digest_len)
            + record_size(signature_len);

        if size > u16::MAX as usize {
            return Err(Error::Size {
                current: size,
                requested: u16::MAX as usize,
            });
        }

        tracing::debug!(
            trailer_size = size,
            digest_len,
            signature_len,
            certificate = certificate.is_some(),
            "planned trailer"
        );

        Ok(TrailerPlan {
            trust,
            key_algorithm: key.algorithm(),
            digest_len,
            signature_len,
            size,
        })
    }

    /// Write the header and append the trailer described by `plan`.
    ///
    /// `key` must be the key the plan was made for.
    pub fn commit(&mut self, plan: &TrailerPlan, key: &Key) -> Result<()> {
        if self.signed {
            return Err(Error::Config(
                "Image is already signed; load a fresh copy to sign again".into(),
            ));
        }
        if key.algorithm() != plan.key_algorithm {
            return Err(Error::Config(format!(
                "Trailer was planned for a {} key, got {}",
                plan.key_algorithm,
                key.algorithm()
            )));
        }

        let header = self.build_header(plan)?;
        let header_bytes = header.to_bytes();
        let reserved = self.options.reserved_size();

        // Signed region: the header followed by the firmware body
        let mut signed_region = Vec::with_capacity(IMAGE_HEADER_SIZE + self.firmware_len());
        signed_region.extend_from_slice(&header_bytes);
        signed_region.extend_from_slice(&self.payload[reserved..]);

        let digest = compute_digest(self.options.hash(), &signed_region);
        if digest.len() != plan.digest_len {
            return Err(Error::Signing(format!(
                "Digest is {} bytes, planned {}",
                digest.len(),
                plan.digest_len
            )));
        }
        tracing::debug!(
            offset = reserved - IMAGE_HEADER_SIZE,
            len = signed_region.len(),
            hash = %self.options.hash(),
            "computed digest"
        );

        let signature = match key.signing_mode() {
            SigningMode::Digest => key.sign(SignInput::Digest(&digest))?,
            SigningMode::FullContent => key.sign(SignInput::Content(&signed_region))?,
        };
        if signature.len() != plan.signature_len {
            return Err(Error::Signing(format!(
                "Signature is {} bytes, planned {}",
                signature.len(),
                plan.signature_len
            )));
        }

        let mut builder = TlvBuilder::with_planned_size(plan.size);
        for (kind, value) in &plan.trust {
            builder = builder.add(*kind, value.as_slice())?;
        }
        let trailer = builder
            .add(TlvKind::Digest, digest)?
            .add(TlvKind::Signature, signature)?
            .finalize()?;

        // Nothing below can fail
        let header_start = reserved - IMAGE_HEADER_SIZE;
        self.payload[..header_start].fill(PAD_BYTE);
        self.payload[header_start..reserved].copy_from_slice(&header_bytes);
        self.payload.extend_from_slice(&trailer);
        self.signed = true;

        tracing::info!(
            image_type = %header.image_type,
            version = format_args!("{}.{}.{}", header.major, header.minor, header.revision),
            hash = %header.hash_algorithm,
            signature = %header.signature_algorithm,
            key = %key.algorithm(),
            firmware_size = header.firmware_size,
            trailer_size = header.trailer_size,
            total_size = header.total_size,
            "signed image"
        );
        Ok(())
    }

    /// Pad the payload with `0xFF` up to `size` rounded up to `align`.
    ///
    /// Padding an already padded image to the same target is a no-op.
    pub fn pad_to(&mut self, size: usize, align: usize) -> Result<()> {
        if !PAD_ALIGNMENTS.contains(&align) {
            return Err(Error::Config(format!(
                "Alignment must be one of 1, 2, 4 or 8, got {}",
                align
            )));
        }

        let target = size
            .div_ceil(align)
            .checked_mul(align)
            .ok_or(Error::Size {
                current: self.payload.len(),
                requested: size,
            })?;
        if self.payload.len() > target {
            return Err(Error::Size {
                current: self.payload.len(),
                requested: target,
            });
        }

        let added = target - self.payload.len();
        self.payload.resize(target, PAD_BYTE);
        tracing::info!(target, added, "padded image");
        Ok(())
    }

    /// Write the payload to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.payload)?;
        tracing::info!(path = %path.display(), len = self.payload.len(), "saved image");
        Ok(())
    }

    fn build_header(&self, plan: &TrailerPlan) -> Result<ImageHeader> {
        let firmware_len = self.firmware_len();

        let firmware_size = u32::try_from(firmware_len).map_err(|_| Error::Size {
            current: firmware_len,
            requested: u32::MAX as usize,
        })?;
        let trailer_size = u16::try_from(plan.size).map_err(|_| Error::Size {
            current: plan.size,
            requested: u16::MAX as usize,
        })?;
        let total = IMAGE_HEADER_SIZE + firmware_len + plan.size;
        let total_size = u32::try_from(total).map_err(|_| Error::Size {
            current: total,
            requested: u32::MAX as usize,
        })?;

        let signature_algorithm = self.options.signature();
        if let Some(native) = plan.key_algorithm.header_algorithm() {
            if native != signature_algorithm {
                tracing::warn!(
                    key = %plan.key_algorithm,
                    header = %signature_algorithm,
                    "key algorithm differs from the header signature algorithm"
                );
            }
        }

        let (major, minor, revision) = split_version(self.options.version());
        let header = ImageHeader {
            total_size,
            manifest_version: MANIFEST_VERSION,
            image_type: self.options.image_type(),
            hash_algorithm: self.options.hash(),
            signature_algorithm,
            header_size: IMAGE_HEADER_SIZE as u16,
            trailer_size,
            firmware_size,
            major,
            minor,
            revision,
            reserved: 0,
        };
        tracing::debug!(?header, "built header");
        Ok(header)
    }
}

fn check_reserved_zero(region: &[u8]) -> Result<()> {
    match region.iter().position(|&b| b != 0) {
        Some(offset) => Err(Error::FormatViolation(format!(
            "Reserved header region is not zero-filled (byte 0x{:02x} at offset {})",
            region[offset], offset
        ))),
        None => Ok(()),
    }
}
