//! Event types surfaced by the host.
//!
//! Every event carries a [`Peer`] handle, so the application can read the data
//! it attached to that peer while handling the event.

use tether_protocol::Packet;

use crate::peer::Peer;

/// Discriminant of an [`Event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A peer connected.
    Connect,
    /// A packet was received.
    Receive,
    /// A peer disconnected.
    Disconnect,
}

/// Events returned by `Host::service`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new connection has been established.
    Connect {
        /// The connected peer.
        peer: Peer,
        /// User data supplied by the connecting side.
        data: u32,
    },
    /// A packet was received from a peer.
    Receive {
        /// The sending peer.
        peer: Peer,
        /// Channel the packet arrived on.
        channel: u8,
        /// The received packet.
        packet: Packet,
    },
    /// A peer disconnected. Its data stays readable until the next service call.
    Disconnect {
        /// The departed peer.
        peer: Peer,
        /// User data supplied with the disconnect.
        data: u32,
    },
}

impl Event {
    /// Returns the peer the event refers to.
    pub fn peer(&self) -> &Peer {
        match self {
            Event::Connect { peer, .. }
            | Event::Receive { peer, .. }
            | Event::Disconnect { peer, .. } => peer,
        }
    }

    /// Returns the kind of event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Connect { .. } => EventKind::Connect,
            Event::Receive { .. } => EventKind::Receive,
            Event::Disconnect { .. } => EventKind::Disconnect,
        }
    }

    /// Returns the received packet, if this is a receive event.
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Event::Receive { packet, .. } => Some(packet),
            _ => None,
        }
    }

    /// Returns the channel of a receive event.
    pub fn channel(&self) -> Option<u8> {
        match self {
            Event::Receive { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// Returns the user data of a connect or disconnect event.
    pub fn data(&self) -> Option<u32> {
        match self {
            Event::Connect { data, .. } | Event::Disconnect { data, .. } => Some(*data),
            Event::Receive { .. } => None,
        }
    }
}
