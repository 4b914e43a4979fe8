//! Per-peer auxiliary data.
//!
//! Every connected peer owns exactly one slot that holds at most one
//! [`EncodedRecord`]. Slots live in an arena keyed by [`PeerId`] instead of
//! behind a raw pointer in the engine's peer structure, so the engine never
//! references memory it does not own and never has to free it.
//!
//! Records are installed as `Arc`s. A reader clones the `Arc` under the read
//! lock and decodes outside of it; a writer swaps the slot under the write
//! lock. A superseded record is therefore freed once the last in-flight
//! reader drops its clone, never earlier.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tether_core::{
    error::{ErrorKind, MalformedRecordKind, Result},
    PeerId,
};
use tether_protocol::{EncodedRecord, RecordDecoder, RecordEncoder};
use tracing::{debug, error, trace, warn};

use crate::peer_state::PeerState;

type Slot = Option<Arc<EncodedRecord>>;

#[derive(Debug)]
struct PeerEntry {
    state: PeerState,
    slot: Slot,
}

/// Arena of auxiliary data slots, one per attached peer.
///
/// Cloning the store is cheap and yields a handle to the same arena, so a
/// host polling on one thread and an application reading on another observe
/// the same slots.
#[derive(Debug, Clone, Default)]
pub struct PeerDataStore {
    entries: Arc<RwLock<HashMap<PeerId, PeerEntry>>>,
}

impl PeerDataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an empty slot for a newly created peer.
    /// Returns false if the identity was already attached; its slot is kept.
    pub fn attach(&self, peer: PeerId, state: PeerState) -> bool {
        let mut entries = self.write();
        if entries.contains_key(&peer) {
            return false;
        }
        entries.insert(peer, PeerEntry { state, slot: None });
        debug!("Attached data slot for peer {} ({:?})", peer, state);
        true
    }

    /// Removes a peer and its slot. Later access reports `UseAfterDisconnect`.
    pub fn detach(&self, peer: PeerId) -> Option<PeerState> {
        let entry = self.write().remove(&peer)?;
        debug!("Released data slot for peer {}", peer);
        Some(entry.state)
    }

    /// Returns true if the peer is attached.
    pub fn contains(&self, peer: PeerId) -> bool {
        self.read().contains_key(&peer)
    }

    /// Returns the lifecycle state of an attached peer.
    pub fn state(&self, peer: PeerId) -> Option<PeerState> {
        self.read().get(&peer).map(|entry| entry.state)
    }

    /// Updates the lifecycle state of an attached peer.
    pub fn set_state(&self, peer: PeerId, state: PeerState) -> Result<()> {
        let mut entries = self.write();
        let entry = entries.get_mut(&peer).ok_or(ErrorKind::UseAfterDisconnect(peer))?;
        entry.state = state;
        Ok(())
    }

    /// Returns the identities of all attached peers.
    pub fn peers(&self) -> Vec<PeerId> {
        self.read().keys().copied().collect()
    }

    /// Returns the number of attached peers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no peer is attached.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Stores a u64 against the peer, replacing whatever was set before.
    pub fn set_fixed(&self, peer: PeerId, value: u64) -> Result<()> {
        self.install(peer, Some(Arc::new(RecordEncoder::fixed_record(value))))
    }

    /// Reads the u64 stored against the peer. `None` if nothing was set.
    pub fn get_fixed(&self, peer: PeerId) -> Result<Option<u64>> {
        match self.snapshot(peer)?.as_deref() {
            None => Ok(None),
            Some(EncodedRecord::Fixed(bytes)) => {
                RecordDecoder::decode_fixed(bytes).map_err(|err| Self::corrupted(peer, err))
            }
            Some(EncodedRecord::Variable(_)) => {
                Err(Self::corrupted(peer, MalformedRecordKind::KindMismatch.into()))
            }
        }
    }

    /// Stores a byte buffer against the peer, or clears the slot with `None`.
    ///
    /// Buffers longer than 255 bytes are rejected with `PayloadTooLarge` and the
    /// previously stored value is left untouched.
    pub fn set_variable(&self, peer: PeerId, data: Option<&[u8]>) -> Result<()> {
        let record = match data {
            None => None,
            Some(data) => match RecordEncoder::variable_record(data) {
                Ok(record) => Some(Arc::new(record)),
                Err(err) => {
                    warn!("Rejected {} bytes of data for peer {}: {}", data.len(), peer, err);
                    return Err(err);
                }
            },
        };
        self.install(peer, record)
    }

    /// Reads the byte buffer stored against the peer.
    ///
    /// `None` means nothing is set; `Some(vec![])` is a zero-length value.
    pub fn get_variable(&self, peer: PeerId) -> Result<Option<Vec<u8>>> {
        match self.snapshot(peer)?.as_deref() {
            None => Ok(None),
            Some(EncodedRecord::Variable(bytes)) => RecordDecoder::decode_variable(bytes)
                .map(|payload| Some(payload.to_vec()))
                .map_err(|err| Self::corrupted(peer, err)),
            Some(EncodedRecord::Fixed(_)) => {
                Err(Self::corrupted(peer, MalformedRecordKind::KindMismatch.into()))
            }
        }
    }

    /// Empties the peer's slot regardless of the record kind.
    pub fn clear(&self, peer: PeerId) -> Result<()> {
        self.install(peer, None)
    }

    /// Returns the installed record, keeping it alive for as long as the caller holds it.
    pub(crate) fn snapshot(&self, peer: PeerId) -> Result<Slot> {
        self.read()
            .get(&peer)
            .map(|entry| entry.slot.clone())
            .ok_or(ErrorKind::UseAfterDisconnect(peer))
    }

    fn install(&self, peer: PeerId, record: Slot) -> Result<()> {
        if let Some(record) = &record {
            trace!(
                "Installing {:?} record ({} bytes) for peer {}",
                record.kind(),
                record.len(),
                peer
            );
        }
        let previous = {
            let mut entries = self.write();
            let entry = entries.get_mut(&peer).ok_or(ErrorKind::UseAfterDisconnect(peer))?;
            std::mem::replace(&mut entry.slot, record)
        };
        // The superseded record is released outside the lock; readers holding
        // a snapshot keep it alive until they are done.
        drop(previous);
        Ok(())
    }

    fn corrupted(peer: PeerId, err: ErrorKind) -> ErrorKind {
        error!("Data slot of peer {} is corrupted: {}", peer, err);
        err
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PeerId, PeerEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PeerId, PeerEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, sync::Arc, thread};

    use super::*;

    fn peer(epoch: u32) -> PeerId {
        let addr: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        PeerId::new(addr, epoch)
    }

    fn attached() -> (PeerDataStore, PeerId) {
        let store = PeerDataStore::new();
        let id = peer(1);
        assert!(store.attach(id, PeerState::Connected));
        (store, id)
    }

    #[test]
    fn overwritten_record_is_reclaimed() {
        let (store, id) = attached();
        store.set_fixed(id, 5).unwrap();
        let old = Arc::downgrade(&store.snapshot(id).unwrap().unwrap());

        store.set_fixed(id, 9).unwrap();
        assert!(old.upgrade().is_none());
        assert_eq!(store.get_fixed(id).unwrap(), Some(9));
    }

    #[test]
    fn in_flight_reader_keeps_old_record_alive() {
        let (store, id) = attached();
        store.set_variable(id, Some(&[1, 2, 3][..])).unwrap();
        let reader = store.snapshot(id).unwrap().unwrap();
        let weak = Arc::downgrade(&reader);

        store.set_variable(id, Some(&[4][..])).unwrap();
        assert_eq!(reader.as_bytes(), &[3, 1, 2, 3]);
        assert_eq!(store.get_variable(id).unwrap(), Some(vec![4]));

        drop(reader);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn detach_releases_slot() {
        let (store, id) = attached();
        store.set_variable(id, Some(&b"session"[..])).unwrap();
        let weak = Arc::downgrade(&store.snapshot(id).unwrap().unwrap());

        assert_eq!(store.detach(id), Some(PeerState::Connected));
        assert!(weak.upgrade().is_none());
        assert!(!store.contains(id));
        assert!(store.detach(id).is_none());
    }

    #[test]
    fn attach_twice_keeps_existing_slot() {
        let (store, id) = attached();
        store.set_fixed(id, 77).unwrap();
        assert!(!store.attach(id, PeerState::Connecting));
        assert_eq!(store.get_fixed(id).unwrap(), Some(77));
        assert_eq!(store.state(id), Some(PeerState::Connected));
    }

    #[test]
    fn kind_mismatch_is_malformed() {
        let (store, id) = attached();
        store.set_fixed(id, 1).unwrap();
        let err = store.get_variable(id).unwrap_err();
        assert!(matches!(err, ErrorKind::MalformedRecord(MalformedRecordKind::KindMismatch)));
        assert!(err.is_fatal());

        store.set_variable(id, Some(&[][..])).unwrap();
        assert!(store.get_fixed(id).is_err());
    }

    #[test]
    fn clear_empties_either_kind() {
        let (store, id) = attached();
        store.set_fixed(id, 1).unwrap();
        store.clear(id).unwrap();
        assert_eq!(store.get_fixed(id).unwrap(), None);
        assert_eq!(store.get_variable(id).unwrap(), None);
    }

    #[test]
    fn write_on_one_thread_is_visible_on_another() {
        let (store, id) = attached();
        let writer = store.clone();
        thread::spawn(move || writer.set_variable(id, Some(&[9, 8, 7][..])).unwrap())
            .join()
            .unwrap();
        assert_eq!(store.get_variable(id).unwrap(), Some(vec![9, 8, 7]));
    }

    #[test]
    fn epochs_keep_slots_apart() {
        let (store, first) = attached();
        let second = peer(2);
        store.attach(second, PeerState::Connected);
        store.set_fixed(first, 1).unwrap();
        assert_eq!(store.get_fixed(second).unwrap(), None);
        assert_eq!(store.len(), 2);
    }
}
