//! Engine abstraction.
//!
//! The connection state machine, packet framing, reliability, and the socket
//! itself belong to an external engine. The host consumes it through this
//! trait only, so any implementation can be plugged in without the host
//! knowing how peers are transported.

use std::{net::SocketAddr, time::Duration};

use tether_core::{error::Result, PeerId};
use tether_protocol::Packet;

/// How a disconnect request is carried out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DisconnectMode {
    /// Ask the remote to disconnect; a disconnect event follows once it confirms.
    #[default]
    Graceful,
    /// Drop the peer immediately. The remote is notified but nothing is
    /// confirmed and no local disconnect event is generated.
    Now,
    /// Disconnect once all queued outgoing packets have been sent.
    Later,
}

/// Events reported by the engine. At most one is returned per poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A connection was established.
    Connect {
        /// Identity of the new peer.
        peer: PeerId,
        /// User data supplied by the connecting side.
        data: u32,
        /// Channels negotiated for the connection.
        channel_count: u8,
    },
    /// A packet arrived from a connected peer.
    Receive {
        /// Sender of the packet.
        peer: PeerId,
        /// Channel the packet was sent on.
        channel: u8,
        /// Received packet.
        packet: Packet,
    },
    /// A peer disconnected, timed out, or a connection attempt failed.
    Disconnect {
        /// Identity of the departed peer.
        peer: PeerId,
        /// User data supplied with the disconnect.
        data: u32,
    },
}

impl EngineEvent {
    /// Returns the peer the event refers to.
    pub fn peer(&self) -> PeerId {
        match self {
            EngineEvent::Connect { peer, .. }
            | EngineEvent::Receive { peer, .. }
            | EngineEvent::Disconnect { peer, .. } => *peer,
        }
    }
}

/// Networking engine that owns peers and their transport.
///
/// Peer identities returned by `connect` or carried in events stay valid until
/// the engine reports the peer's disconnect.
pub trait Engine {
    /// Returns the address this engine is bound to.
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Starts connecting to a remote host and returns the new peer's identity.
    /// A `Connect` event follows on success, a `Disconnect` event on failure.
    fn connect(&mut self, address: SocketAddr, channel_count: u8, data: u32) -> Result<PeerId>;

    /// Returns the next event, waiting at most `timeout` for one to arrive.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<EngineEvent>>;

    /// Queues a packet for a peer on a channel.
    fn send(&mut self, peer: PeerId, channel: u8, packet: Packet) -> Result<()>;

    /// Disconnects a peer, passing `data` to the remote side.
    fn disconnect(&mut self, peer: PeerId, data: u32, mode: DisconnectMode) -> Result<()>;
}
