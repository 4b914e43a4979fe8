//! Record encoding.

use byteorder::{ByteOrder, LittleEndian};

use tether_core::{
    constants::{FIXED_RECORD_SIZE, MAX_PEER_DATA_LENGTH},
    error::{ErrorKind, Result},
};

use crate::record::EncodedRecord;

/// Serializes application values into peer data records.
pub struct RecordEncoder;

impl RecordEncoder {
    /// Encodes a u64 as a present fixed record. Never fails.
    pub fn encode_fixed(value: u64) -> [u8; FIXED_RECORD_SIZE] {
        let mut record = [0u8; FIXED_RECORD_SIZE];
        record[0] = 1;
        LittleEndian::write_u64(&mut record[1..], value);
        record
    }

    /// Encodes a payload as a length-prefixed record.
    ///
    /// Payloads longer than [`MAX_PEER_DATA_LENGTH`] are rejected, never truncated.
    pub fn encode_variable(payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > MAX_PEER_DATA_LENGTH {
            return Err(ErrorKind::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PEER_DATA_LENGTH,
            });
        }
        let mut record = Vec::with_capacity(1 + payload.len());
        record.push(payload.len() as u8);
        record.extend_from_slice(payload);
        Ok(record)
    }

    /// Builds an installable fixed record.
    pub fn fixed_record(value: u64) -> EncodedRecord {
        EncodedRecord::Fixed(Self::encode_fixed(value))
    }

    /// Builds an installable variable record.
    pub fn variable_record(payload: &[u8]) -> Result<EncodedRecord> {
        Self::encode_variable(payload)
            .map(|record| EncodedRecord::Variable(record.into_boxed_slice()))
    }
}
