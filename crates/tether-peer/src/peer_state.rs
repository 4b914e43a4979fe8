/// Peer connection lifecycle as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeerState {
    /// Local side asked the engine to connect; no connect event yet.
    #[default]
    Connecting,

    /// Engine reported the connection; data can be sent.
    Connected,

    /// A graceful disconnect was requested, waiting for the engine to confirm.
    Disconnecting,

    /// Disconnect event was surfaced; the slot is released on the next service call.
    Zombie,
}

impl PeerState {
    /// Returns true if the peer is in a state where data can be sent.
    pub fn is_active(&self) -> bool {
        matches!(self, PeerState::Connected | PeerState::Connecting)
    }
}
