//! Session ids attached to peers.
//!
//! A server hands every connecting peer a session id and reads it back from
//! the peer on each received packet and on disconnect, without keeping its
//! own address-to-session table.
//!
//! Run:
//! - cargo run -p tether --example session_ids

use std::time::Duration;

use tether::{Config, Event, Host, LoopbackEngine, LoopbackNetwork, PacketFlags, Peer};
use tracing::Level;

const CLIENTS: usize = 3;

/// Services the host until it has nothing left to report.
///
/// Each event is handled before the next service call, since a disconnected
/// peer's data is released by that call.
fn pump(
    host: &mut Host<LoopbackEngine>,
    mut on_event: impl FnMut(Event) -> Result<(), tether::ErrorKind>,
) -> Result<(), tether::ErrorKind> {
    while let Some(event) = host.service(Duration::ZERO)? {
        on_event(event)?;
    }
    Ok(())
}

fn handle_server_event(event: Event, next_session: &mut u64) -> Result<(), tether::ErrorKind> {
    match event {
        Event::Connect { peer, .. } => {
            *next_session += 1;
            peer.set_data_u64(*next_session)?;
            println!("[connect] {} -> session {}", peer.address(), next_session);
        }
        Event::Receive { peer, packet, .. } => {
            let session = peer.get_data_u64()?.unwrap_or_default();
            println!(
                "[packet] session {} sent \"{}\"",
                session,
                String::from_utf8_lossy(packet.payload())
            );
        }
        Event::Disconnect { peer, data } => {
            let session = peer.get_data_u64()?.unwrap_or_default();
            println!("[disconnect] session {} left (reason {})", session, data);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let network = LoopbackNetwork::new();
    let config = Config::default();
    let mut server = Host::new(network.bind_any(&config)?, config.clone());
    let server_addr = server.local_addr()?;
    println!("Server listening on {}", server_addr);

    let mut clients = Vec::new();
    for _ in 0..CLIENTS {
        let mut client = Host::new(network.bind_any(&config)?, config.clone());
        let to_server: Peer = client.connect(server_addr, 1, 0)?;
        clients.push((client, to_server));
    }

    let mut next_session = 0;
    pump(&mut server, |event| handle_server_event(event, &mut next_session))?;

    for (index, (client, to_server)) in clients.iter_mut().enumerate() {
        pump(client, |_| Ok(()))?;
        to_server.send_string(&format!("hello from client {}", index), 0, PacketFlags::RELIABLE)?;
        to_server.disconnect(index as u32)?;
        pump(client, |_| Ok(()))?;
    }

    pump(&mut server, |event| handle_server_event(event, &mut next_session))?;
    println!("Server has {} peers left", server.peer_count());
    Ok(())
}
