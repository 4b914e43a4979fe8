use std::{
    fmt,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use crossbeam_channel::Sender;
use tether_core::{
    error::{ErrorKind, Result},
    PeerId,
};
use tether_peer::{PeerDataStore, PeerState};
use tether_protocol::{Packet, PacketFlags};

use crate::engine::DisconnectMode;

/// Work a peer handle asks its host to forward to the engine.
#[derive(Debug)]
pub(crate) enum PeerCommand {
    Send { peer: PeerId, channel: u8, packet: Packet },
    Disconnect { peer: PeerId, data: u32, mode: DisconnectMode },
}

/// Handle to a peer owned by the engine.
///
/// Handles are cheap to clone and may be moved to other threads. Sends and
/// disconnects are queued and forwarded to the engine by the host's next
/// `service` call; attached data is read and written directly.
#[derive(Clone)]
pub struct Peer {
    id: PeerId,
    /// Requested count until the engine reports the negotiated one
    channel_count: Arc<AtomicU8>,
    store: PeerDataStore,
    commands: Sender<PeerCommand>,
}

impl Peer {
    pub(crate) fn new(
        id: PeerId,
        channel_count: Arc<AtomicU8>,
        store: PeerDataStore,
        commands: Sender<PeerCommand>,
    ) -> Self {
        Self { id, channel_count, store, commands }
    }

    /// Returns the peer's stable identity.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Returns the remote address of the peer.
    pub fn address(&self) -> SocketAddr {
        self.id.address()
    }

    /// Returns the number of channels available on this connection.
    pub fn channel_count(&self) -> u8 {
        self.channel_count.load(Ordering::Acquire)
    }

    /// Returns the current lifecycle state, or `None` once the peer is released.
    pub fn state(&self) -> Option<PeerState> {
        self.store.state(self.id)
    }

    /// Attaches a u64 to this peer, e.g. an application session id.
    pub fn set_data_u64(&self, value: u64) -> Result<()> {
        self.store.set_fixed(self.id, value)
    }

    /// Returns the u64 attached to this peer, or `None` if none was set.
    pub fn get_data_u64(&self) -> Result<Option<u64>> {
        self.store.get_fixed(self.id)
    }

    /// Attaches up to 255 bytes to this peer. `None` clears the data.
    ///
    /// Longer buffers fail with `PayloadTooLarge` and leave the current data in place.
    pub fn set_data(&self, data: Option<&[u8]>) -> Result<()> {
        self.store.set_variable(self.id, data)
    }

    /// Returns the bytes attached to this peer.
    ///
    /// `None` means no data is set; an empty vector means empty data was set.
    pub fn get_data(&self) -> Result<Option<Vec<u8>>> {
        self.store.get_variable(self.id)
    }

    /// Queues a copy of `data` for sending on `channel`.
    pub fn send_bytes(&self, data: &[u8], channel: u8, flags: PacketFlags) -> Result<()> {
        self.send_packet(Packet::new(data, flags), channel)
    }

    /// Queues a UTF-8 string for sending on `channel`.
    pub fn send_string(&self, text: &str, channel: u8, flags: PacketFlags) -> Result<()> {
        self.send_bytes(text.as_bytes(), channel, flags)
    }

    /// Queues a packet for sending on `channel`.
    ///
    /// Fails with `UseAfterDisconnect` once a disconnect was requested or reported.
    pub fn send_packet(&self, packet: Packet, channel: u8) -> Result<()> {
        let channel_count = self.channel_count();
        if channel >= channel_count {
            return Err(ErrorKind::InvalidChannel { channel, channel_count });
        }
        match self.store.state(self.id) {
            Some(state) if state.is_active() => {}
            _ => return Err(ErrorKind::UseAfterDisconnect(self.id)),
        }
        self.forward(PeerCommand::Send { peer: self.id, channel, packet })
    }

    /// Requests a graceful disconnect; a disconnect event follows once the remote confirms.
    pub fn disconnect(&self, data: u32) -> Result<()> {
        self.request_disconnect(data, DisconnectMode::Graceful)
    }

    /// Drops the peer without waiting for the remote. No disconnect event is generated.
    pub fn disconnect_now(&self, data: u32) -> Result<()> {
        self.request_disconnect(data, DisconnectMode::Now)
    }

    /// Disconnects once all queued outgoing packets have been sent.
    pub fn disconnect_later(&self, data: u32) -> Result<()> {
        self.request_disconnect(data, DisconnectMode::Later)
    }

    fn request_disconnect(&self, data: u32, mode: DisconnectMode) -> Result<()> {
        self.ensure_attached()?;
        self.forward(PeerCommand::Disconnect { peer: self.id, data, mode })
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.store.contains(self.id) {
            Ok(())
        } else {
            Err(ErrorKind::UseAfterDisconnect(self.id))
        }
    }

    fn forward(&self, command: PeerCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| ErrorKind::HostShutdown)
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Peer {}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("channel_count", &self.channel_count())
            .finish()
    }
}
