/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Pluggable peer-to-peer networking.

use std::fmt::{self, Display, Formatter};

use ed25519_dalek::VerifyingKey;

use crate::messages::{LogicType, SyncMessage};
use crate::types::basic::{BlockNumber, CryptoHash};

/// The transport collaborator. Peers are identified by their [Ed25519 public
/// key](ed25519_dalek::VerifyingKey); connection management, framing and gossip de-duplication
/// all live behind this trait.
pub trait Network: Clone + Send + 'static {
    /// Send a message to the specified peer without blocking.
    fn send(&mut self, peer: VerifyingKey, message: SyncMessage);

    /// Record the chain head a peer advertised for the given logic channel. Fails if the peer is
    /// not currently connected.
    fn set_peer_block_number(
        &mut self,
        peer: VerifyingKey,
        logic_type: LogicType,
        block_number: BlockNumber,
    ) -> Result<(), PeerNotConnected>;

    /// Drop the "seen" marker the transport keeps for the given message hash, so that a repeat
    /// of the message from this peer is delivered again instead of being de-duplicated away.
    fn remove_message_hash(&mut self, peer: VerifyingKey, message_hash: CryptoHash);

    /// The peers that are both connected and members of the current consensus set.
    fn alive_consensus_peers(&self) -> Vec<VerifyingKey>;
}

#[derive(Debug)]
pub struct PeerNotConnected(pub VerifyingKey);

impl Display for PeerNotConnected {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "peer is not connected")
    }
}

impl std::error::Error for PeerNotConnected {}
