use std::{fmt, net::SocketAddr};

/// Stable identity of a connected peer.
///
/// The engine assigns the address and a connection epoch when the peer
/// connects. The pair stays the same for the peer's whole connected lifetime,
/// and a reconnect from the same address gets a new epoch, so identities are
/// never reused across connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId {
    address: SocketAddr,
    epoch: u32,
}

impl PeerId {
    /// Creates an identity from the remote address and connection epoch.
    pub fn new(address: SocketAddr, epoch: u32) -> Self {
        Self { address, epoch }
    }

    /// Returns the remote endpoint address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the connection epoch.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.address, self.epoch)
    }
}
