//! Packet types handed to and received from the engine.
//!
//! - `PacketFlags`: delivery flags for an outgoing packet
//! - `Packet`: payload plus flags

use std::ops::{BitOr, BitOrAssign};

use tether_core::shared::SharedBytes;

/// Delivery flags attached to a packet when it is queued for sending.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct PacketFlags(u32);

impl PacketFlags {
    /// Unreliable, sequenced delivery.
    pub const NONE: PacketFlags = PacketFlags(0);
    /// Packet must be received by the target peer and resent until it is.
    pub const RELIABLE: PacketFlags = PacketFlags(1 << 0);
    /// Packet will not be sequenced with other packets.
    pub const UNSEQUENCED: PacketFlags = PacketFlags(1 << 1);
    /// Packet is fragmented unreliably if it exceeds the MTU.
    pub const UNRELIABLE_FRAGMENT: PacketFlags = PacketFlags(1 << 3);

    /// Builds flags from raw bits, dropping unknown bits.
    pub fn from_bits_truncate(bits: u32) -> Self {
        let known = Self::RELIABLE.0 | Self::UNSEQUENCED.0 | Self::UNRELIABLE_FRAGMENT.0;
        PacketFlags(bits & known)
    }

    /// Returns the raw bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub fn contains(&self, other: PacketFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the packet requests reliable delivery.
    pub fn is_reliable(&self) -> bool {
        self.contains(Self::RELIABLE)
    }
}

impl BitOr for PacketFlags {
    type Output = PacketFlags;

    fn bitor(self, rhs: PacketFlags) -> PacketFlags {
        PacketFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PacketFlags {
    fn bitor_assign(&mut self, rhs: PacketFlags) {
        self.0 |= rhs.0;
    }
}

/// A payload together with its delivery flags.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Packet {
    payload: SharedBytes,
    flags: PacketFlags,
}

impl Packet {
    /// Creates a packet from a payload and flags.
    pub fn new(payload: impl Into<SharedBytes>, flags: PacketFlags) -> Packet {
        Packet { payload: payload.into(), flags }
    }

    /// Creates a reliable packet.
    pub fn reliable(payload: impl Into<SharedBytes>) -> Packet {
        Packet::new(payload, PacketFlags::RELIABLE)
    }

    /// Creates an unreliable, sequenced packet.
    pub fn unreliable(payload: impl Into<SharedBytes>) -> Packet {
        Packet::new(payload, PacketFlags::NONE)
    }

    /// Returns a slice of the packet payload.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }

    /// Returns a cheap clone of the shared payload.
    pub fn shared_payload(&self) -> SharedBytes {
        self.payload.clone()
    }

    /// Returns the delivery flags.
    pub fn flags(&self) -> PacketFlags {
        self.flags
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
