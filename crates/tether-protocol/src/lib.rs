#![warn(missing_docs)]

//! tether-protocol: peer data records and packet types.

/// Packet types and send flags.
pub mod packet;
/// Encoded record layouts stored behind a peer's auxiliary slot.
pub mod record;
/// Record serialization and deserialization.
pub mod record_codec;

pub use packet::{Packet, PacketFlags};
pub use record::{EncodedRecord, RecordKind};
pub use record_codec::{RecordDecoder, RecordEncoder};
