//! Record decoding and validation.

use byteorder::{ByteOrder, LittleEndian};

use tether_core::{
    constants::FIXED_RECORD_SIZE,
    error::{MalformedRecordKind, Result},
};

/// Deserializes peer data records.
pub struct RecordDecoder;

impl RecordDecoder {
    /// Decodes a fixed record. `None` means the presence byte is clear.
    pub fn decode_fixed(bytes: &[u8]) -> Result<Option<u64>> {
        if bytes.len() != FIXED_RECORD_SIZE {
            return Err(MalformedRecordKind::WrongLength {
                expected: FIXED_RECORD_SIZE,
                actual: bytes.len(),
            }
            .into());
        }
        if bytes[0] == 0 {
            return Ok(None);
        }
        Ok(Some(LittleEndian::read_u64(&bytes[1..])))
    }

    /// Decodes a variable record and returns its payload, which may be empty.
    ///
    /// Absence is never reported here; an empty slot is handled by the caller.
    pub fn decode_variable(bytes: &[u8]) -> Result<&[u8]> {
        let (&declared, payload) = bytes.split_first().ok_or(MalformedRecordKind::Empty)?;
        if declared as usize != payload.len() {
            return Err(MalformedRecordKind::LengthMismatch {
                declared: declared as usize,
                actual: payload.len(),
            }
            .into());
        }
        Ok(payload)
    }
}
