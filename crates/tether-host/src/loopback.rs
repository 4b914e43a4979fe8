//! In-process engine.
//!
//! `LoopbackNetwork` is a registry of bound addresses; each `LoopbackEngine`
//! owns an inbox on it and exchanges datagrams with other engines on the same
//! network. Delivery is immediate and in order, and nothing is ever lost, so
//! the engine only models the connection lifecycle the host depends on:
//! connect/accept/refuse, payload delivery, the three disconnect modes, and
//! the peer limit. It stands in for a real engine in tests and demos.

use std::{
    collections::{HashMap, VecDeque},
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rand::Rng;
use tether_core::{
    config::Config,
    error::{ErrorKind, Result},
    PeerId,
};
use tether_protocol::Packet;
use tracing::{debug, trace};

use crate::engine::{DisconnectMode, Engine, EngineEvent};

/// First port handed out by `bind_any`.
const EPHEMERAL_PORT_START: u16 = 49152;

#[derive(Debug)]
enum Message {
    Connect { channel_count: u8, data: u32 },
    Accept { channel_count: u8 },
    Refuse,
    Payload { channel: u8, packet: Packet },
    Disconnect { data: u32, confirm: bool },
    DisconnectAck,
}

#[derive(Debug)]
struct Datagram {
    from: SocketAddr,
    epoch: u32,
    message: Message,
}

#[derive(Debug, Default)]
struct Registry {
    endpoints: HashMap<SocketAddr, Sender<Datagram>>,
    next_port: u16,
}

/// Shared registry connecting loopback engines.
#[derive(Debug, Clone, Default)]
pub struct LoopbackNetwork {
    registry: Arc<Mutex<Registry>>,
}

impl LoopbackNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an engine to `address`. Fails if the address is already in use.
    pub fn bind(&self, address: SocketAddr, config: &Config) -> Result<LoopbackEngine> {
        let (sender, inbox) = unbounded();
        {
            let mut registry = self.registry();
            if registry.endpoints.contains_key(&address) {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    format!("{} is already bound", address),
                )
                .into());
            }
            registry.endpoints.insert(address, sender);
        }
        debug!("Loopback engine bound to {}", address);
        Ok(LoopbackEngine {
            address,
            network: self.clone(),
            inbox,
            links: HashMap::new(),
            pending: VecDeque::new(),
            peer_limit: config.peer_limit,
            channel_count: config.channel_count.max(1),
        })
    }

    /// Binds an engine to the next free port on 127.0.0.1.
    pub fn bind_any(&self, config: &Config) -> Result<LoopbackEngine> {
        let address = {
            let mut registry = self.registry();
            let mut port = registry.next_port.max(EPHEMERAL_PORT_START);
            loop {
                let address = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
                if !registry.endpoints.contains_key(&address) {
                    registry.next_port = port.saturating_add(1);
                    break address;
                }
                port = port.checked_add(1).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::AddrNotAvailable, "no free loopback ports")
                })?;
            }
        };
        self.bind(address, config)
    }

    fn deliver(&self, to: SocketAddr, datagram: Datagram) -> bool {
        let sender = match self.registry().endpoints.get(&to) {
            Some(sender) => sender.clone(),
            None => return false,
        };
        sender.send(datagram).is_ok()
    }

    fn unbind(&self, address: SocketAddr) {
        self.registry().endpoints.remove(&address);
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    /// Outgoing connect sent, waiting for accept.
    Pending,
    Connected,
    /// Graceful disconnect sent, waiting for the remote's ack.
    Disconnecting { data: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Link {
    state: LinkState,
    channel_count: u8,
}

/// Engine endpoint on a [`LoopbackNetwork`].
#[derive(Debug)]
pub struct LoopbackEngine {
    address: SocketAddr,
    network: LoopbackNetwork,
    inbox: Receiver<Datagram>,
    links: HashMap<PeerId, Link>,
    /// Locally generated events waiting to be polled
    pending: VecDeque<EngineEvent>,
    peer_limit: usize,
    channel_count: u8,
}

impl LoopbackEngine {
    /// Returns the number of peers with a live link.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    fn transmit(&self, peer: PeerId, message: Message) -> bool {
        trace!("{} -> {}: {:?}", self.address, peer, message);
        self.network.deliver(
            peer.address(),
            Datagram { from: self.address, epoch: peer.epoch(), message },
        )
    }

    /// Drops a link whose remote endpoint is gone and reports the loss.
    fn lose(&mut self, peer: PeerId) {
        if self.links.remove(&peer).is_some() {
            debug!("Lost loopback peer {}", peer);
            self.pending.push_back(EngineEvent::Disconnect { peer, data: 0 });
        }
    }

    fn handle(&mut self, datagram: Datagram) -> Option<EngineEvent> {
        let peer = PeerId::new(datagram.from, datagram.epoch);
        match datagram.message {
            Message::Connect { channel_count, data } => {
                if self.links.contains_key(&peer) {
                    return None;
                }
                if self.links.len() >= self.peer_limit {
                    debug!("Refusing {}: peer limit {} reached", peer, self.peer_limit);
                    self.transmit(peer, Message::Refuse);
                    return None;
                }
                let channel_count = channel_count.clamp(1, self.channel_count);
                self.links.insert(peer, Link { state: LinkState::Connected, channel_count });
                if !self.transmit(peer, Message::Accept { channel_count }) {
                    self.links.remove(&peer);
                    return None;
                }
                Some(EngineEvent::Connect { peer, data, channel_count })
            }
            Message::Accept { channel_count } => {
                let link = self.links.get_mut(&peer)?;
                if link.state != LinkState::Pending {
                    return None;
                }
                link.state = LinkState::Connected;
                link.channel_count = link.channel_count.min(channel_count);
                let channel_count = link.channel_count;
                Some(EngineEvent::Connect { peer, data: 0, channel_count })
            }
            Message::Refuse => {
                self.links.remove(&peer)?;
                Some(EngineEvent::Disconnect { peer, data: 0 })
            }
            Message::Payload { channel, packet } => {
                let link = self.links.get(&peer)?;
                if link.state == LinkState::Pending || channel >= link.channel_count {
                    trace!("Dropping payload from {} on channel {}", peer, channel);
                    return None;
                }
                Some(EngineEvent::Receive { peer, channel, packet })
            }
            Message::Disconnect { data, confirm } => {
                self.links.remove(&peer)?;
                if confirm {
                    self.transmit(peer, Message::DisconnectAck);
                }
                Some(EngineEvent::Disconnect { peer, data })
            }
            Message::DisconnectAck => match self.links.remove(&peer)?.state {
                LinkState::Disconnecting { data } => Some(EngineEvent::Disconnect { peer, data }),
                _ => Some(EngineEvent::Disconnect { peer, data: 0 }),
            },
        }
    }
}

impl Engine for LoopbackEngine {
    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.address)
    }

    fn connect(&mut self, address: SocketAddr, channel_count: u8, data: u32) -> Result<PeerId> {
        if self.links.len() >= self.peer_limit {
            return Err(ErrorKind::PeerLimitReached { limit: self.peer_limit });
        }
        let mut rng = rand::rng();
        let peer = loop {
            let candidate = PeerId::new(address, rng.random());
            if !self.links.contains_key(&candidate) {
                break candidate;
            }
        };
        let channel_count = channel_count.max(1);
        self.links.insert(peer, Link { state: LinkState::Pending, channel_count });
        if !self.transmit(peer, Message::Connect { channel_count, data }) {
            // Nobody listens there; report the failed attempt like a timeout.
            self.lose(peer);
        }
        Ok(peer)
    }

    fn poll_event(&mut self, timeout: Duration) -> Result<Option<EngineEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inbox.recv_timeout(remaining) {
                Ok(datagram) => {
                    if let Some(event) = self.handle(datagram) {
                        return Ok(Some(event));
                    }
                    if let Some(event) = self.pending.pop_front() {
                        return Ok(Some(event));
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(None)
                }
            }
        }
    }

    fn send(&mut self, peer: PeerId, channel: u8, packet: Packet) -> Result<()> {
        let link = match self.links.get(&peer) {
            Some(link) if !matches!(link.state, LinkState::Disconnecting { .. }) => *link,
            _ => return Err(ErrorKind::UnknownPeer(peer)),
        };
        if channel >= link.channel_count {
            return Err(ErrorKind::InvalidChannel { channel, channel_count: link.channel_count });
        }
        if !self.transmit(peer, Message::Payload { channel, packet }) {
            self.lose(peer);
        }
        Ok(())
    }

    fn disconnect(&mut self, peer: PeerId, data: u32, mode: DisconnectMode) -> Result<()> {
        let link = self.links.get_mut(&peer).ok_or(ErrorKind::UnknownPeer(peer))?;
        match mode {
            DisconnectMode::Now => {
                self.links.remove(&peer);
                self.transmit(peer, Message::Disconnect { data, confirm: false });
            }
            // Delivery is immediate, so nothing is ever left queued behind a
            // later disconnect.
            DisconnectMode::Graceful | DisconnectMode::Later => {
                link.state = LinkState::Disconnecting { data };
                if !self.transmit(peer, Message::Disconnect { data, confirm: true }) {
                    self.links.remove(&peer);
                    self.pending.push_back(EngineEvent::Disconnect { peer, data });
                }
            }
        }
        Ok(())
    }
}

impl Drop for LoopbackEngine {
    fn drop(&mut self) {
        self.network.unbind(self.address);
    }
}
