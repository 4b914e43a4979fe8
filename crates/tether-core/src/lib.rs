#![warn(missing_docs)]

//! tether-core: foundational types and utilities.
//!
//! This crate provides the minimal set of core utilities shared across all layers:
//! - Configuration types
//! - Error handling
//! - Peer identity
//! - Shared payload buffers
//!
//! Layer-specific logic lives in specialized crates:
//! - `tether-protocol`: peer data record codec, packet types
//! - `tether-peer`: peer state and the auxiliary data store
//! - `tether-host`: engine interface, host service loop, peer handles

/// Constants shared across layers.
pub mod constants {
    /// Largest payload that can be attached to a peer as variable data.
    ///
    /// The variable record stores its length in a single prefix byte.
    pub const MAX_PEER_DATA_LENGTH: usize = u8::MAX as usize;
    /// Size of an encoded fixed record: presence byte plus a little-endian u64.
    pub const FIXED_RECORD_SIZE: usize = 9;
    /// Number of channels allocated per connection if none was specified.
    pub const DEFAULT_CHANNEL_COUNT: u8 = 1;
    /// Default maximum number of simultaneous peers per host.
    pub const DEFAULT_PEER_LIMIT: usize = 32;
}

/// Configuration options for hosts and engines.
pub mod config;
/// Error types and results.
pub mod error;
/// Stable peer identity assigned by the engine.
pub mod peer_id;
/// Shared, reference-counted byte slices with zero-copy slicing.
pub mod shared;

pub use peer_id::PeerId;
