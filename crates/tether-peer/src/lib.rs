#![warn(missing_docs)]

//! tether-peer: per-peer state and attached application data.

/// Auxiliary data store keyed by peer identity.
pub mod data_store;
mod peer_state;

pub use data_store::PeerDataStore;
pub use peer_state::PeerState;
pub use tether_core::PeerId;
