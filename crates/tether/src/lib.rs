#![warn(missing_docs)]

//! Tether: a small public API facade for the workspace.
//!
//! Peers are owned by a networking engine; tether hands the application a
//! [`Peer`] handle with every event and lets it attach data to that peer,
//! either a single `u64` or up to [`MAX_PEER_DATA_LENGTH`] bytes, without the
//! engine having to manage that data's lifetime.
//!
//! - Host and events (`Host`, `Event`, `EventKind`)
//! - Peer handles (`Peer`, `PeerId`, `PeerState`)
//! - Engine interface and the in-process loopback engine
//! - Core configuration (`Config`) and errors (`ErrorKind`)
//!
//! Example
//! ```
//! use std::time::Duration;
//! use tether::{Config, Event, Host, LoopbackNetwork, PacketFlags};
//!
//! let network = LoopbackNetwork::new();
//! let config = Config::default();
//! let mut server = Host::new(network.bind_any(&config).unwrap(), config.clone());
//! let mut client = Host::new(network.bind_any(&config).unwrap(), config);
//!
//! let to_server = client.connect(server.local_addr().unwrap(), 1, 0).unwrap();
//! if let Some(Event::Connect { peer, .. }) = server.service(Duration::ZERO).unwrap() {
//!     peer.set_data_u64(17).unwrap();
//! }
//!
//! client.service(Duration::ZERO).unwrap();
//! to_server.send_string("hi", 0, PacketFlags::RELIABLE).unwrap();
//! client.service(Duration::ZERO).unwrap();
//!
//! let event = server.service(Duration::ZERO).unwrap().unwrap();
//! assert_eq!(event.peer().get_data_u64().unwrap(), Some(17));
//! ```

// Core config, errors, identity
pub use tether_core::{
    config::Config,
    constants::MAX_PEER_DATA_LENGTH,
    error::{ErrorKind, MalformedRecordKind, Result},
    PeerId,
};
// Host: engine interface, events, and peer handles
pub use tether_host::{
    DisconnectMode, Engine, EngineEvent, Event, EventKind, Host, LoopbackEngine, LoopbackNetwork,
    Peer,
};
// Peer state and the data store
pub use tether_peer::{PeerDataStore, PeerState};
// Protocol: packets
pub use tether_protocol::{Packet, PacketFlags};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        Config, Engine, ErrorKind, Event, EventKind, Host, Packet, PacketFlags, Peer, PeerId,
        PeerState,
    };
}
