#![warn(missing_docs)]

//! tether-host: host service loop and peer handles over an external engine.

/// Interface consumed from the networking engine.
pub mod engine;
/// Events surfaced to the application.
pub mod event_types;
/// Host driving an engine and owning the peer data store.
pub mod host;
/// In-process engine for tests and demos.
pub mod loopback;
/// Peer handle API handed to the application.
pub mod peer;

pub use engine::{DisconnectMode, Engine, EngineEvent};
pub use event_types::{Event, EventKind};
pub use host::Host;
pub use loopback::{LoopbackEngine, LoopbackNetwork};
pub use peer::Peer;
