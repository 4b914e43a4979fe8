//! Error types shared by every tether layer.

use std::{io, result};

use thiserror::Error;

use crate::peer_id::PeerId;

/// Convenience alias used throughout the workspace.
pub type Result<T> = result::Result<T, ErrorKind>;

/// Errors that can occur while attaching data to peers or driving a host.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Variable peer data exceeds what a length-prefixed record can hold.
    /// The caller must shrink the value; the previously stored value is untouched.
    #[error("peer data too large: {len} bytes (max: {max})")]
    PayloadTooLarge {
        /// Length of the rejected payload.
        len: usize,
        /// Largest accepted length.
        max: usize,
    },
    /// A stored record does not match the layout its writer produced.
    /// Indicates memory corruption or a foreign write; not recoverable.
    #[error("malformed peer data record: {0}")]
    MalformedRecord(MalformedRecordKind),
    /// The peer was never attached or its disconnect has already been processed.
    #[error("peer {0} used after disconnect")]
    UseAfterDisconnect(PeerId),
    /// The engine does not know this peer.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),
    /// Channel id outside the channel count negotiated for the connection.
    #[error("invalid channel {channel} (channel count: {channel_count})")]
    InvalidChannel {
        /// Requested channel.
        channel: u8,
        /// Channels available on the connection.
        channel_count: u8,
    },
    /// The engine refused a connection because all peer slots are in use.
    #[error("peer limit reached: {limit}")]
    PeerLimitReached {
        /// Configured peer limit.
        limit: usize,
    },
    /// A peer handle was used after its host was dropped.
    #[error("host has shut down")]
    HostShutdown,
    /// Wrapper around a std io error.
    #[error("I/O error: {0}")]
    IOError(#[from] io::Error),
}

/// Ways in which a stored record can be inconsistent with its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedRecordKind {
    /// A fixed record was not exactly the fixed size.
    #[error("expected {expected} bytes, found {actual}")]
    WrongLength {
        /// Size the layout requires.
        expected: usize,
        /// Size that was observed.
        actual: usize,
    },
    /// A variable record's length prefix disagrees with its payload.
    #[error("length prefix {declared} does not match payload of {actual} bytes")]
    LengthMismatch {
        /// Length stored in the prefix byte.
        declared: usize,
        /// Bytes following the prefix.
        actual: usize,
    },
    /// A variable record without even a length prefix.
    #[error("empty record")]
    Empty,
    /// The slot holds a record of the other kind (fixed vs. variable).
    #[error("record kind mismatch")]
    KindMismatch,
}

impl From<MalformedRecordKind> for ErrorKind {
    fn from(kind: MalformedRecordKind) -> Self {
        ErrorKind::MalformedRecord(kind)
    }
}

impl ErrorKind {
    /// Returns true for errors that signal a broken internal invariant or a
    /// usage error rather than a rejected input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::MalformedRecord(_) | ErrorKind::UseAfterDisconnect(_))
    }
}
