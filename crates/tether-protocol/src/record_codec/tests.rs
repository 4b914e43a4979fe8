//! Encoder/decoder tests for peer data records.

use tether_core::error::{ErrorKind, MalformedRecordKind};

use super::{RecordDecoder, RecordEncoder};
use crate::record::{EncodedRecord, RecordKind};

fn malformed(err: ErrorKind) -> MalformedRecordKind {
    match err {
        ErrorKind::MalformedRecord(kind) => kind,
        other => panic!("expected malformed record, got {:?}", other),
    }
}

#[test]
fn test_fixed_layout_is_presence_then_little_endian() {
    let record = RecordEncoder::encode_fixed(0x0102_0304_0506_0708);
    assert_eq!(record, [1, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_fixed_values_survive_decoding() {
    for value in [0, 1, 5, 9, u32::MAX as u64, u64::MAX] {
        let record = RecordEncoder::encode_fixed(value);
        assert_eq!(RecordDecoder::decode_fixed(&record).unwrap(), Some(value));
    }
}

#[test]
fn test_fixed_zero_is_present() {
    let record = RecordEncoder::encode_fixed(0);
    assert_eq!(RecordDecoder::decode_fixed(&record).unwrap(), Some(0));
}

#[test]
fn test_fixed_cleared_presence_is_absent() {
    let mut record = RecordEncoder::encode_fixed(42);
    record[0] = 0;
    assert_eq!(RecordDecoder::decode_fixed(&record).unwrap(), None);
}

#[test]
fn test_fixed_wrong_length_is_malformed() {
    let err = RecordDecoder::decode_fixed(&[1, 2, 3]).unwrap_err();
    assert_eq!(malformed(err), MalformedRecordKind::WrongLength { expected: 9, actual: 3 });

    let err = RecordDecoder::decode_fixed(&[0; 10]).unwrap_err();
    assert_eq!(malformed(err), MalformedRecordKind::WrongLength { expected: 9, actual: 10 });
}

#[test]
fn test_variable_empty_payload_keeps_prefix() {
    let record = RecordEncoder::encode_variable(&[]).unwrap();
    assert_eq!(record, vec![0x00]);
    assert_eq!(RecordDecoder::decode_variable(&record).unwrap(), &[] as &[u8]);
}

#[test]
fn test_variable_prefix_matches_payload() {
    let record = RecordEncoder::encode_variable(&[1, 2, 3]).unwrap();
    assert_eq!(record, vec![3, 1, 2, 3]);
    assert_eq!(RecordDecoder::decode_variable(&record).unwrap(), &[1, 2, 3]);
}

#[test]
fn test_variable_max_length_accepted() {
    let payload = vec![0u8; 255];
    let record = RecordEncoder::encode_variable(&payload).unwrap();
    assert_eq!(record.len(), 256);
    assert_eq!(record[0], 255);
    assert_eq!(RecordDecoder::decode_variable(&record).unwrap(), payload.as_slice());
}

#[test]
fn test_variable_oversized_rejected() {
    let err = RecordEncoder::encode_variable(&[0u8; 256]).unwrap_err();
    assert!(matches!(err, ErrorKind::PayloadTooLarge { len: 256, max: 255 }));
    assert!(RecordEncoder::variable_record(&[7u8; 1000]).is_err());
}

#[test]
fn test_variable_empty_input_is_malformed() {
    let err = RecordDecoder::decode_variable(&[]).unwrap_err();
    assert_eq!(malformed(err), MalformedRecordKind::Empty);
}

#[test]
fn test_variable_prefix_mismatch_is_malformed() {
    let err = RecordDecoder::decode_variable(&[4, 1, 2, 3]).unwrap_err();
    assert_eq!(malformed(err), MalformedRecordKind::LengthMismatch { declared: 4, actual: 3 });

    let err = RecordDecoder::decode_variable(&[0, 1]).unwrap_err();
    assert_eq!(malformed(err), MalformedRecordKind::LengthMismatch { declared: 0, actual: 1 });
}

#[test]
fn test_installable_records_report_kind() {
    let fixed = RecordEncoder::fixed_record(3);
    assert_eq!(fixed.kind(), RecordKind::Fixed);
    assert_eq!(fixed.len(), 9);

    let variable = RecordEncoder::variable_record(b"abc").unwrap();
    assert_eq!(variable.kind(), RecordKind::Variable);
    assert_eq!(variable, EncodedRecord::Variable(vec![3, b'a', b'b', b'c'].into_boxed_slice()));
    assert!(!variable.is_empty());
}
