//! Certificate blobs carried in the image trailer.
//!
//! The certificate is opaque to the image format: whatever DER or PEM bytes
//! the file holds are copied verbatim into the certificate TLV record. It is
//! paired with a separate certificate key whose public half goes into the
//! certificate-public-key record.

use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// An opaque certificate loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    bytes: Vec<u8>,
    source: Option<PathBuf>,
}

impl Certificate {
    /// Load a certificate file (PEM or DER) as raw bytes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        tracing::debug!(path = %path.display(), len = bytes.len(), "loaded certificate");
        Ok(Self {
            bytes,
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap certificate bytes already in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            source: None,
        }
    }

    /// Raw certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the certificate in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the certificate file was empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Path the certificate was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_keeps_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cert.der");
        fs::write(&path, [0x30, 0x82, 0x01, 0x0a]).unwrap();

        let cert = Certificate::load(&path).unwrap();
        assert_eq!(cert.as_bytes(), &[0x30, 0x82, 0x01, 0x0a]);
        assert_eq!(cert.len(), 4);
        assert_eq!(cert.source(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Certificate::load("/nonexistent/cert.pem");
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
