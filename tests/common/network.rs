use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use ed25519_dalek::VerifyingKey;

use viewsync::messages::{LogicType, SyncMessage};
use viewsync::network::{Network, PeerNotConnected};
use viewsync::types::basic::{BlockNumber, CryptoHash};

/// A mock network stub which records everything the synchronizer asks of it instead of putting
/// bytes on a wire.
#[derive(Clone)]
pub(crate) struct MockNetwork {
    inner: Arc<Mutex<NetworkInner>>,
}

struct NetworkInner {
    sent: Vec<(VerifyingKey, SyncMessage)>,
    peer_block_numbers: Vec<(VerifyingKey, LogicType, BlockNumber)>,
    removed_message_hashes: Vec<(VerifyingKey, CryptoHash)>,
    connected: HashSet<VerifyingKey>,
    alive_consensus_peers: Vec<VerifyingKey>,
}

impl MockNetwork {
    pub(crate) fn new() -> MockNetwork {
        MockNetwork {
            inner: Arc::new(Mutex::new(NetworkInner {
                sent: Vec::new(),
                peer_block_numbers: Vec::new(),
                removed_message_hashes: Vec::new(),
                connected: HashSet::new(),
                alive_consensus_peers: Vec::new(),
            })),
        }
    }

    /// Mark the peer as connected and as a member of the current consensus set.
    pub(crate) fn connect(&self, peer: VerifyingKey) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected.insert(peer);
        inner.alive_consensus_peers.push(peer);
    }

    pub(crate) fn sent(&self) -> Vec<(VerifyingKey, SyncMessage)> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub(crate) fn sent_kinds(&self) -> Vec<&'static str> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|(_, message)| message.kind())
            .collect()
    }

    #[allow(dead_code)]
    pub(crate) fn peer_block_numbers(&self) -> Vec<(VerifyingKey, LogicType, BlockNumber)> {
        self.inner.lock().unwrap().peer_block_numbers.clone()
    }

    pub(crate) fn removed_message_hashes(&self) -> Vec<(VerifyingKey, CryptoHash)> {
        self.inner.lock().unwrap().removed_message_hashes.clone()
    }
}

impl Network for MockNetwork {
    fn send(&mut self, peer: VerifyingKey, message: SyncMessage) {
        self.inner.lock().unwrap().sent.push((peer, message));
    }

    fn set_peer_block_number(
        &mut self,
        peer: VerifyingKey,
        logic_type: LogicType,
        block_number: BlockNumber,
    ) -> Result<(), PeerNotConnected> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected.contains(&peer) {
            return Err(PeerNotConnected(peer));
        }
        inner.peer_block_numbers.push((peer, logic_type, block_number));
        Ok(())
    }

    fn remove_message_hash(&mut self, peer: VerifyingKey, message_hash: CryptoHash) {
        self.inner
            .lock()
            .unwrap()
            .removed_message_hashes
            .push((peer, message_hash));
    }

    fn alive_consensus_peers(&self) -> Vec<VerifyingKey> {
        self.inner.lock().unwrap().alive_consensus_peers.clone()
    }
}
