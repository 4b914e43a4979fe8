//! End-to-end peer data tests.
//!
//! A server and a client host run their own polling loops on separate
//! threads, like two independent engine instances would. Server events are
//! forwarded to the test thread, which reads and writes peer data while
//! handling them.

use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tether_core::{
    config::Config,
    constants::MAX_PEER_DATA_LENGTH,
    error::{ErrorKind, Result},
};
use tether_host::{Event, EventKind, Host, LoopbackEngine, LoopbackNetwork, Peer};
use tether_protocol::PacketFlags;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    to_server: Peer,
    server_events: Receiver<Event>,
    _client_events: Receiver<Event>,
    shutdown: Vec<Sender<()>>,
    loops: Vec<JoinHandle<Result<()>>>,
}

impl Harness {
    fn next_server_event(&self) -> Event {
        self.server_events.recv_timeout(EVENT_TIMEOUT).expect("server event")
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        for stop in self.shutdown.drain(..) {
            let _ = stop.send(());
        }
        for handle in self.loops.drain(..) {
            handle.join().expect("polling thread panicked").expect("polling loop failed");
        }
    }
}

fn spawn_loop(
    mut host: Host<LoopbackEngine>,
) -> (Receiver<Event>, Sender<()>, JoinHandle<Result<()>>) {
    let (event_tx, event_rx) = unbounded();
    let (stop_tx, stop_rx) = unbounded();
    let handle = thread::spawn(move || host.start_polling(&event_tx, &stop_rx));
    (event_rx, stop_tx, handle)
}

fn create_server_client() -> Harness {
    let network = LoopbackNetwork::new();
    let config = Config::default();

    let server = Host::new(network.bind_any(&config).unwrap(), config.clone());
    let server_addr = server.local_addr().unwrap();
    let mut client = Host::new(network.bind_any(&config).unwrap(), config);
    let to_server = client.connect(server_addr, 1, 0).unwrap();

    let (server_events, server_stop, server_loop) = spawn_loop(server);
    let (client_events, client_stop, client_loop) = spawn_loop(client);

    Harness {
        to_server,
        server_events,
        _client_events: client_events,
        shutdown: vec![server_stop, client_stop],
        loops: vec![server_loop, client_loop],
    }
}

fn assert_peer_data(peer: &Peer, expected: Option<&[u8]>, msg: &str) {
    let actual = peer.get_data().unwrap();
    assert_eq!(actual.as_deref(), expected, "{}", msg);
}

#[test]
fn test_peer_data_survives_across_events() {
    let test_data: &[u8] = &[0x1, 0x2, 0x3];
    let harness = create_server_client();

    let ev = harness.next_server_event();
    assert_eq!(ev.kind(), EventKind::Connect);
    assert_peer_data(ev.peer(), None, "new peer");

    ev.peer().set_data(Some(test_data)).unwrap();
    assert_peer_data(ev.peer(), Some(test_data), "immediate after set");

    harness.to_server.send_string("testmessage", 0, PacketFlags::RELIABLE).unwrap();

    let ev = harness.next_server_event();
    assert_eq!(ev.kind(), EventKind::Receive);
    assert_eq!(ev.packet().unwrap().payload(), b"testmessage");
    assert_peer_data(ev.peer(), Some(test_data), "on packet received");

    ev.peer().set_data(None).unwrap();
    assert_peer_data(ev.peer(), None, "none set");

    ev.peer().set_data(Some(&[][..])).unwrap();
    assert_peer_data(ev.peer(), Some(&[][..]), "empty set");

    ev.peer().set_data(Some(&[1, 2, 3][..])).unwrap();
    assert_peer_data(ev.peer(), Some(&[1, 2, 3][..]), "overwrite");

    let max = vec![0u8; MAX_PEER_DATA_LENGTH];
    ev.peer().set_data(Some(&max[..])).unwrap();
    assert_peer_data(ev.peer(), Some(&max[..]), "max length");

    let err = ev.peer().set_data(Some(&vec![0u8; MAX_PEER_DATA_LENGTH + 1][..])).unwrap_err();
    assert!(matches!(err, ErrorKind::PayloadTooLarge { len: 256, max: 255 }));
    assert_peer_data(ev.peer(), Some(&max[..]), "unchanged after rejected set");
}

#[test]
fn test_fixed_peer_data_survives_across_events() {
    let harness = create_server_client();

    let ev = harness.next_server_event();
    assert_eq!(ev.peer().get_data_u64().unwrap(), None);

    ev.peer().set_data_u64(5).unwrap();
    ev.peer().set_data_u64(9).unwrap();

    harness.to_server.send_bytes(&[42], 0, PacketFlags::NONE).unwrap();
    let ev = harness.next_server_event();
    assert_eq!(ev.kind(), EventKind::Receive);
    assert_eq!(ev.peer().get_data_u64().unwrap(), Some(9));
    assert_eq!(ev.peer().get_data_u64().unwrap(), Some(9));
}

#[test]
fn test_data_written_on_test_thread_is_seen_from_other_handles() {
    let harness = create_server_client();

    let ev = harness.next_server_event();
    let copy = ev.peer().clone();
    let writer = thread::spawn(move || copy.set_data(Some(&b"session-17"[..])).unwrap());
    writer.join().unwrap();

    harness.to_server.send_string("hello", 0, PacketFlags::RELIABLE).unwrap();
    let ev = harness.next_server_event();
    assert_peer_data(ev.peer(), Some(&b"session-17"[..]), "written from another thread");
}
