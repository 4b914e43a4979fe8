//! Encoded peer data records.
//!
//! Two layouts can occupy a peer's auxiliary slot:
//!
//! ```text
//! fixed:    [presence:u8][value:u64 LE]        always 9 bytes
//! variable: [len:u8][payload; len]             1..=256 bytes
//! ```
//!
//! A fixed record carries its own presence flag, so an installed fixed record
//! can still mean "no value". A variable record has no such flag; its absence
//! is an empty slot, which keeps "never set" apart from "set to zero bytes".

use tether_core::constants::FIXED_RECORD_SIZE;

/// Which layout a record uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// Presence byte followed by a little-endian u64.
    Fixed,
    /// Length prefix followed by up to 255 payload bytes.
    Variable,
}

/// An encoded record as it is installed into a peer's slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodedRecord {
    /// Fixed-size integer record.
    Fixed([u8; FIXED_RECORD_SIZE]),
    /// Length-prefixed byte record.
    Variable(Box<[u8]>),
}

impl EncodedRecord {
    /// Returns the layout of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            EncodedRecord::Fixed(_) => RecordKind::Fixed,
            EncodedRecord::Variable(_) => RecordKind::Variable,
        }
    }

    /// Returns the raw encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedRecord::Fixed(bytes) => &bytes[..],
            EncodedRecord::Variable(bytes) => &bytes[..],
        }
    }

    /// Returns the encoded length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Always false: even a zero-length variable record keeps its prefix byte.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}
