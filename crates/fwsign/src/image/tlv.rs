//! TLV trailer encoding and parsing
//!
//! The trailer appended after the firmware body is a block of typed,
//! length-prefixed records behind a small block header.
//!
//! ## Structure
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Block header (4 bytes)             │
//! │  - magic: 0x6907 (2 bytes)         │
//! │  - total: block size (2 bytes)     │
//! ├────────────────────────────────────┤
//! │ Record 0                           │
//! │  - type (1 byte)                   │
//! │  - reserved: 0 (1 byte)            │
//! │  - length (2 bytes)                │
//! │  - value (length bytes)            │
//! ├────────────────────────────────────┤
//! │ ... more records                   │
//! └────────────────────────────────────┘
//! ```
//!
//! `total` counts the block header and every record. The image header stores
//! the same figure, and the header is written (and hashed) before any record
//! exists, so the size is planned first with [`record_size`] and then checked
//! against what [`TlvBuilder::finalize`] actually produced.

use crate::format::{TlvKind, TLV_HEADER_SIZE, TLV_INFO_MAGIC, TLV_INFO_SIZE};
use crate::{Error, Result};

/// Encoded size of a record carrying `value_len` bytes.
pub fn record_size(value_len: usize) -> usize {
    TLV_HEADER_SIZE + value_len
}

/// A single trailer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvRecord {
    /// The record kind
    pub kind: TlvKind,
    /// The record payload
    pub value: Vec<u8>,
}

impl TlvRecord {
    /// Create a new record.
    pub fn new(kind: TlvKind, value: Vec<u8>) -> Self {
        Self { kind, value }
    }

    /// Encoded size including the record header.
    pub fn encoded_len(&self) -> usize {
        record_size(self.value.len())
    }
}

/// Builder for the trailer block.
///
/// Records are emitted in insertion order; the verifier depends on it.
///
/// # Example
///
/// ```ignore
/// let planned = TLV_INFO_SIZE + record_size(32) + record_size(32) + record_size(64);
/// let block = TlvBuilder::with_planned_size(planned)
///     .add(TlvKind::PublicKey, public_key)?
///     .add(TlvKind::Digest, digest)?
///     .add(TlvKind::Signature, signature)?
///     .finalize()?;
/// ```
#[derive(Debug, Default)]
pub struct TlvBuilder {
    records: Vec<TlvRecord>,
    planned_size: Option<usize>,
}

impl TlvBuilder {
    /// Create an empty builder with no size expectation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder whose finished block must be exactly `size` bytes.
    pub fn with_planned_size(size: usize) -> Self {
        Self {
            records: Vec::new(),
            planned_size: Some(size),
        }
    }

    /// Append a record.
    ///
    /// Fails if the value does not fit the 16-bit length field.
    pub fn add(mut self, kind: TlvKind, value: impl Into<Vec<u8>>) -> Result<Self> {
        let value = value.into();
        if value.len() > u16::MAX as usize {
            return Err(Error::Size {
                current: value.len(),
                requested: u16::MAX as usize,
            });
        }
        self.records.push(TlvRecord::new(kind, value));
        Ok(self)
    }

    /// Append a record given its raw type code.
    ///
    /// Unknown codes fail with [`Error::FormatViolation`].
    pub fn add_code(self, code: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        let kind = TlvKind::from_code(code)?;
        self.add(kind, value)
    }

    /// Size of the block as it stands now.
    pub fn size(&self) -> usize {
        TLV_INFO_SIZE + self.records.iter().map(TlvRecord::encoded_len).sum::<usize>()
    }

    /// Records added so far.
    pub fn records(&self) -> &[TlvRecord] {
        &self.records
    }

    /// Serialize the block header followed by every record.
    ///
    /// Fails with [`Error::FormatViolation`] if a planned size was given and
    /// the records add up to something else.
    pub fn finalize(self) -> Result<Vec<u8>> {
        let total = self.size();

        if let Some(planned) = self.planned_size {
            if planned != total {
                return Err(Error::FormatViolation(format!(
                    "TLV block is {} bytes but {} were planned",
                    total, planned
                )));
            }
        }

        let total_field = u16::try_from(total).map_err(|_| Error::Size {
            current: total,
            requested: u16::MAX as usize,
        })?;

        let mut buf = Vec::with_capacity(total);
        buf.extend(&TLV_INFO_MAGIC.to_le_bytes());
        buf.extend(&total_field.to_le_bytes());

        for record in &self.records {
            buf.push(record.kind.code());
            buf.push(0);
            buf.extend(&(record.value.len() as u16).to_le_bytes());
            buf.extend(&record.value);
        }

        Ok(buf)
    }
}

/// A parsed trailer block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvBlock {
    records: Vec<TlvRecord>,
}

impl TlvBlock {
    /// Parse a trailer block from the start of `data`.
    ///
    /// Bytes after the declared block size are ignored, so `data` may run to
    /// the end of a padded image.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < TLV_INFO_SIZE {
            return Err(Error::FormatViolation("TLV block truncated".into()));
        }

        let magic = u16::from_le_bytes([data[0], data[1]]);
        if magic != TLV_INFO_MAGIC {
            return Err(Error::FormatViolation(format!(
                "Bad TLV magic 0x{magic:04x}, expected 0x{TLV_INFO_MAGIC:04x}"
            )));
        }

        let total = u16::from_le_bytes([data[2], data[3]]) as usize;
        if total < TLV_INFO_SIZE || total > data.len() {
            return Err(Error::FormatViolation(format!(
                "TLV block size {} out of range (have {} bytes)",
                total,
                data.len()
            )));
        }

        let mut records = Vec::new();
        let mut pos = TLV_INFO_SIZE;
        while pos < total {
            if pos + TLV_HEADER_SIZE > total {
                return Err(Error::FormatViolation("malformed TLV chain".into()));
            }
            let kind = TlvKind::from_code(data[pos])?;
            let len = u16::from_le_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let value_start = pos + TLV_HEADER_SIZE;
            if value_start + len > total {
                return Err(Error::FormatViolation("malformed TLV chain".into()));
            }
            records.push(TlvRecord::new(kind, data[value_start..value_start + len].to_vec()));
            pos = value_start + len;
        }

        Ok(Self { records })
    }

    /// Records in trailer order.
    pub fn records(&self) -> &[TlvRecord] {
        &self.records
    }

    /// Record kinds in trailer order.
    pub fn kinds(&self) -> Vec<TlvKind> {
        self.records.iter().map(|r| r.kind).collect()
    }

    /// Value of the first record of `kind`.
    pub fn find(&self, kind: TlvKind) -> Option<&[u8]> {
        self.records
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.value.as_slice())
    }

    /// Encoded size of the block.
    pub fn size(&self) -> usize {
        TLV_INFO_SIZE + self.records.iter().map(TlvRecord::encoded_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_structure() {
        let block = TlvBuilder::new()
            .add(TlvKind::Digest, vec![0xab; 32])
            .unwrap()
            .finalize()
            .unwrap();

        // Magic
        assert_eq!(&block[0..2], &TLV_INFO_MAGIC.to_le_bytes());

        // Total: 4 + 4 + 32
        let total = u16::from_le_bytes([block[2], block[3]]);
        assert_eq!(total, 40);
        assert_eq!(block.len(), 40);

        // Record header: type, reserved, length
        assert_eq!(block[4], TlvKind::Digest.code());
        assert_eq!(block[5], 0);
        assert_eq!(u16::from_le_bytes([block[6], block[7]]), 32);
        assert_eq!(&block[8..], &[0xab; 32]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let block = TlvBuilder::new()
            .add(TlvKind::CertificatePublicKey, vec![1; 3])
            .unwrap()
            .add(TlvKind::Certificate, vec![2; 5])
            .unwrap()
            .add(TlvKind::Digest, vec![3; 32])
            .unwrap()
            .add(TlvKind::Signature, vec![4; 64])
            .unwrap()
            .finalize()
            .unwrap();

        // Record types at 4, 4+4+3, 4+7+4+5, ...
        assert_eq!(block[4], 0x02);
        assert_eq!(block[11], 0x03);
        assert_eq!(block[20], 0x01);
        assert_eq!(block[56], 0x05);
    }

    #[test]
    fn test_planned_size_must_match() {
        let planned = TLV_INFO_SIZE + record_size(32);
        let ok = TlvBuilder::with_planned_size(planned)
            .add(TlvKind::Digest, vec![0; 32])
            .unwrap()
            .finalize();
        assert!(ok.is_ok());

        let short = TlvBuilder::with_planned_size(planned)
            .add(TlvKind::Digest, vec![0; 64])
            .unwrap()
            .finalize();
        assert!(matches!(short, Err(Error::FormatViolation(_))));
    }

    #[test]
    fn test_add_code_rejects_unknown_type() {
        let result = TlvBuilder::new().add_code(0x42, vec![1, 2, 3]);
        assert!(matches!(result, Err(Error::FormatViolation(_))));

        let builder = TlvBuilder::new().add_code(0x04, vec![1, 2, 3]).unwrap();
        assert_eq!(builder.records()[0].kind, TlvKind::PublicKey);
    }

    #[test]
    fn test_oversized_value_rejected() {
        let result = TlvBuilder::new().add(TlvKind::Certificate, vec![0; 70_000]);
        assert!(matches!(result, Err(Error::Size { .. })));
    }

    #[test]
    fn test_parse_reads_back_records() {
        let block = TlvBuilder::new()
            .add(TlvKind::PublicKey, vec![9; 32])
            .unwrap()
            .add(TlvKind::Digest, vec![8; 32])
            .unwrap()
            .finalize()
            .unwrap();

        let mut padded = block.clone();
        padded.extend([0xff; 16]);

        let parsed = TlvBlock::parse(&padded).unwrap();
        assert_eq!(parsed.kinds(), vec![TlvKind::PublicKey, TlvKind::Digest]);
        assert_eq!(parsed.find(TlvKind::Digest), Some(&[8u8; 32][..]));
        assert_eq!(parsed.find(TlvKind::Signature), None);
        assert_eq!(parsed.size(), block.len());
    }

    #[test]
    fn test_parse_rejects_bad_magic_and_truncation() {
        assert!(matches!(
            TlvBlock::parse(&[0x00, 0x00, 0x04, 0x00]),
            Err(Error::FormatViolation(_))
        ));
        assert!(matches!(
            TlvBlock::parse(&[0x07, 0x69]),
            Err(Error::FormatViolation(_))
        ));
        // Record claims more bytes than the block holds
        assert!(matches!(
            TlvBlock::parse(&[0x07, 0x69, 0x08, 0x00, 0x01, 0x00, 0x10, 0x00]),
            Err(Error::FormatViolation(_))
        ));
    }

    #[test]
    fn test_empty_block() {
        let block = TlvBuilder::new().finalize().unwrap();
        assert_eq!(block, vec![0x07, 0x69, 0x04, 0x00]);
        assert!(TlvBlock::parse(&block).unwrap().records().is_empty());
    }
}
