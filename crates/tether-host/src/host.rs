use std::{
    collections::HashMap,
    fmt,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use tether_core::{config::Config, error::Result, PeerId};
use tether_peer::{PeerDataStore, PeerState};
use tracing::{debug, error, trace, warn};

use crate::{
    engine::{DisconnectMode, Engine, EngineEvent},
    event_types::Event,
    peer::{Peer, PeerCommand},
};

/// Drives an engine and keeps the data attached to its peers.
///
/// The host is the only writer of peer lifecycle into the data store: a slot
/// is attached when a peer is created and released one `service` call after
/// the peer's disconnect event was returned, so the application can still
/// read the data while handling that event.
pub struct Host<E: Engine> {
    engine: E,
    config: Config,
    store: PeerDataStore,
    /// Channels per peer, shared with its handles so the negotiated count
    /// reaches handles created before the connect event
    channel_counts: HashMap<PeerId, Arc<AtomicU8>>,
    command_sender: Sender<PeerCommand>,
    command_receiver: Receiver<PeerCommand>,
    /// Peers whose disconnect was surfaced and whose slot goes on the next service
    released: Vec<PeerId>,
}

impl<E: Engine> fmt::Debug for Host<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.config)
            .field("peers", &self.channel_counts.len())
            .field("pending_release", &self.released)
            .finish()
    }
}

impl<E: Engine> Host<E> {
    /// Creates a host over an engine.
    pub fn new(engine: E, config: Config) -> Self {
        let (command_sender, command_receiver) = unbounded();
        Self {
            engine,
            config,
            store: PeerDataStore::new(),
            channel_counts: HashMap::new(),
            command_sender,
            command_receiver,
            released: Vec::new(),
        }
    }

    /// Starts connecting to a remote host.
    ///
    /// The returned peer can carry data right away; a `Connect` event follows
    /// once the engine establishes the connection.
    pub fn connect(&mut self, address: SocketAddr, channel_count: u8, data: u32) -> Result<Peer> {
        let channel_count = channel_count.max(1);
        let id = self.engine.connect(address, channel_count, data)?;
        self.store.attach(id, PeerState::Connecting);
        let channel_count = Arc::new(AtomicU8::new(channel_count));
        self.channel_counts.insert(id, channel_count.clone());
        debug!("Connecting to {} as peer {}", address, id);
        Ok(self.handle(id, channel_count))
    }

    /// Services the engine once and returns at most one event.
    ///
    /// Forwards queued peer commands first, then waits up to `timeout` for the
    /// engine to report something.
    pub fn service(&mut self, timeout: Duration) -> Result<Option<Event>> {
        self.release_departed();
        self.flush();

        let event = match self.engine.poll_event(timeout)? {
            Some(event) => event,
            None => return Ok(None),
        };
        Ok(self.surface(event))
    }

    /// Forwards queued sends and disconnects to the engine without polling.
    pub fn flush(&mut self) {
        while let Ok(command) = self.command_receiver.try_recv() {
            match command {
                PeerCommand::Send { peer, channel, packet } => {
                    if let Err(err) = self.engine.send(peer, channel, packet) {
                        error!("Error occurred sending a packet to {}: {}", peer, err);
                    }
                }
                PeerCommand::Disconnect { peer, data, mode } => {
                    if let Err(err) = self.engine.disconnect(peer, data, mode) {
                        error!("Error occurred disconnecting {}: {}", peer, err);
                        continue;
                    }
                    let state = match mode {
                        DisconnectMode::Now => {
                            self.released.push(peer);
                            PeerState::Zombie
                        }
                        DisconnectMode::Graceful | DisconnectMode::Later => {
                            PeerState::Disconnecting
                        }
                    };
                    if let Err(err) = self.store.set_state(peer, state) {
                        trace!("Peer {} already released: {}", peer, err);
                    }
                }
            }
        }
    }

    /// Runs `service` in a loop, forwarding events until `shutdown` fires or
    /// either channel is disconnected. Intended to run on a dedicated thread.
    pub fn start_polling(&mut self, events: &Sender<Event>, shutdown: &Receiver<()>) -> Result<()> {
        loop {
            match shutdown.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => return Ok(()),
                Err(TryRecvError::Empty) => {}
            }
            if let Some(event) = self.service(self.config.polling_timeout)? {
                if events.send(event).is_err() {
                    return Ok(());
                }
            }
        }
    }

    /// Returns a handle to a live peer.
    pub fn peer(&self, id: PeerId) -> Option<Peer> {
        let channel_count = self.channel_counts.get(&id)?.clone();
        Some(self.handle(id, channel_count))
    }

    /// Returns handles to all live peers.
    pub fn peers(&self) -> Vec<Peer> {
        self.channel_counts.iter().map(|(id, count)| self.handle(*id, count.clone())).collect()
    }

    /// Returns the number of live peers, including ones still connecting.
    pub fn peer_count(&self) -> usize {
        self.channel_counts.len()
    }

    /// Returns the store holding the data attached to this host's peers.
    pub fn store(&self) -> &PeerDataStore {
        &self.store
    }

    /// Returns the host configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the address the engine is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.engine.local_addr()
    }

    fn surface(&mut self, event: EngineEvent) -> Option<Event> {
        match event {
            EngineEvent::Connect { peer, data, channel_count } => {
                // An outgoing connection completed when the slot already exists.
                if !self.store.attach(peer, PeerState::Connected) {
                    if let Err(err) = self.store.set_state(peer, PeerState::Connected) {
                        warn!("Connect event for released peer {}: {}", peer, err);
                        return None;
                    }
                }
                let shared = self.channel_counts.entry(peer).or_default().clone();
                shared.store(channel_count, Ordering::Release);
                Some(Event::Connect { peer: self.handle(peer, shared), data })
            }
            EngineEvent::Receive { peer, channel, packet } => {
                let Some(channel_count) = self.live_channel_count(peer) else {
                    warn!("Dropping packet from unknown peer {}", peer);
                    return None;
                };
                Some(Event::Receive { peer: self.handle(peer, channel_count), channel, packet })
            }
            EngineEvent::Disconnect { peer, data } => {
                let Some(channel_count) = self.live_channel_count(peer) else {
                    warn!("Ignoring disconnect of unknown peer {}", peer);
                    return None;
                };
                if let Err(err) = self.store.set_state(peer, PeerState::Zombie) {
                    trace!("Peer {} already released: {}", peer, err);
                }
                self.released.push(peer);
                Some(Event::Disconnect { peer: self.handle(peer, channel_count), data })
            }
        }
    }

    fn live_channel_count(&self, peer: PeerId) -> Option<Arc<AtomicU8>> {
        if !self.store.contains(peer) {
            return None;
        }
        self.channel_counts.get(&peer).cloned()
    }

    fn release_departed(&mut self) {
        for peer in self.released.drain(..) {
            self.channel_counts.remove(&peer);
            self.store.detach(peer);
        }
    }

    fn handle(&self, id: PeerId, channel_count: Arc<AtomicU8>) -> Peer {
        Peer::new(id, channel_count, self.store.clone(), self.command_sender.clone())
    }
}
