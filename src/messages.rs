/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for structured messages that are sent between peers as part of the catch-up
//! protocol.
//!
//! Every inbound message is routed by its [SyncMessage] discriminant to the matching handler of
//! the [Synchronizer](crate::sync::process::Synchronizer). Messages come in request/response
//! pairs (`GetX`/`X`); the exceptions are [PrepareBlock], [PrepareVote] and [PrepareBlockHash],
//! which are ordinary progress traffic that this crate only inspects for gap detection.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::Digest;

use crate::types::{
    basic::*,
    block::{Block, CryptoHasher},
    certificates::*,
};

/// Sum of every wire message kind exchanged by the catch-up protocol.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub enum SyncMessage {
    GetPrepareBlock(GetPrepareBlock),
    PrepareBlock(PrepareBlock),
    PrepareBlockHash(PrepareBlockHash),
    GetBlockQuorumCert(GetBlockQuorumCert),
    BlockQuorumCert(BlockQuorumCert),
    GetQCBlockList(GetQCBlockList),
    QCBlockList(QCBlockList),
    GetPrepareVote(GetPrepareVote),
    PrepareVotes(PrepareVotes),
    PrepareVote(PrepareVote),
    GetLatestStatus(GetLatestStatus),
    LatestStatus(LatestStatus),
    GetViewChange(GetViewChange),
    ViewChanges(ViewChanges),
    ViewChangeQuorumCert(ViewChangeQuorumCert),
}

impl SyncMessage {
    pub fn get_prepare_block(
        epoch: Epoch,
        view_number: ViewNumber,
        block_index: BlockIndex,
    ) -> SyncMessage {
        SyncMessage::GetPrepareBlock(GetPrepareBlock {
            epoch,
            view_number,
            block_index,
        })
    }

    pub fn get_block_quorum_cert(
        block_hash: CryptoHash,
        block_number: BlockNumber,
    ) -> SyncMessage {
        SyncMessage::GetBlockQuorumCert(GetBlockQuorumCert {
            block_hash,
            block_number,
        })
    }

    pub fn get_qc_block_list(block_hash: CryptoHash, block_number: BlockNumber) -> SyncMessage {
        SyncMessage::GetQCBlockList(GetQCBlockList {
            block_hash,
            block_number,
        })
    }

    pub fn qc_block_list(blocks: Vec<Block>, qcs: Vec<QuorumCertificate>) -> SyncMessage {
        SyncMessage::QCBlockList(QCBlockList { blocks, qcs })
    }

    pub fn prepare_votes(
        epoch: Epoch,
        view_number: ViewNumber,
        block_index: BlockIndex,
        votes: Vec<PrepareVote>,
    ) -> SyncMessage {
        SyncMessage::PrepareVotes(PrepareVotes {
            epoch,
            view_number,
            block_index,
            votes,
        })
    }

    pub fn latest_status(
        block_number: BlockNumber,
        block_hash: CryptoHash,
        logic_type: LogicType,
    ) -> SyncMessage {
        SyncMessage::LatestStatus(LatestStatus {
            block_number,
            block_hash,
            logic_type,
        })
    }

    pub fn view_changes(view_changes: Vec<ViewChange>) -> SyncMessage {
        SyncMessage::ViewChanges(ViewChanges { view_changes })
    }

    /// The name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::GetPrepareBlock(_) => "GetPrepareBlock",
            SyncMessage::PrepareBlock(_) => "PrepareBlock",
            SyncMessage::PrepareBlockHash(_) => "PrepareBlockHash",
            SyncMessage::GetBlockQuorumCert(_) => "GetBlockQuorumCert",
            SyncMessage::BlockQuorumCert(_) => "BlockQuorumCert",
            SyncMessage::GetQCBlockList(_) => "GetQCBlockList",
            SyncMessage::QCBlockList(_) => "QCBlockList",
            SyncMessage::GetPrepareVote(_) => "GetPrepareVote",
            SyncMessage::PrepareVotes(_) => "PrepareVotes",
            SyncMessage::PrepareVote(_) => "PrepareVote",
            SyncMessage::GetLatestStatus(_) => "GetLatestStatus",
            SyncMessage::LatestStatus(_) => "LatestStatus",
            SyncMessage::GetViewChange(_) => "GetViewChange",
            SyncMessage::ViewChanges(_) => "ViewChanges",
            SyncMessage::ViewChangeQuorumCert(_) => "ViewChangeQuorumCert",
        }
    }

    /// SHA-256 over the borsh encoding of the message. The transport layer keys its
    /// seen-message bookkeeping by this hash.
    pub fn msg_hash(&self) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(&self.try_to_vec().unwrap());
        CryptoHash::new(hasher.finalize().into())
    }
}

/// The logic channel a [GetLatestStatus]/[LatestStatus] exchange refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum LogicType {
    QCBlock,
    LockedBlock,
    CommitBlock,
}

/// Ask a peer for the prepare-block at `block_index` of its current view.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct GetPrepareBlock {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_index: BlockIndex,
}

impl Into<SyncMessage> for GetPrepareBlock {
    fn into(self) -> SyncMessage {
        SyncMessage::GetPrepareBlock(self)
    }
}

/// A block proposed at `block_index` of the view `(epoch, view_number)`. Sent both as ordinary
/// progress traffic and as the response to [GetPrepareBlock].
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct PrepareBlock {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_index: BlockIndex,
    pub block: Block,
}

impl Into<SyncMessage> for PrepareBlock {
    fn into(self) -> SyncMessage {
        SyncMessage::PrepareBlock(self)
    }
}

/// Announcement that a block exists at `block_index` of the view `(epoch, view_number)`, without
/// carrying the block itself.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct PrepareBlockHash {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_index: BlockIndex,
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
}

impl Into<SyncMessage> for PrepareBlockHash {
    fn into(self) -> SyncMessage {
        SyncMessage::PrepareBlockHash(self)
    }
}

/// Ask a peer for the quorum certificate of the block identified by hash and number.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct GetBlockQuorumCert {
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
}

impl Into<SyncMessage> for GetBlockQuorumCert {
    fn into(self) -> SyncMessage {
        SyncMessage::GetBlockQuorumCert(self)
    }
}

/// Response to [GetBlockQuorumCert].
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct BlockQuorumCert {
    pub block_qc: QuorumCertificate,
}

impl Into<SyncMessage> for BlockQuorumCert {
    fn into(self) -> SyncMessage {
        SyncMessage::BlockQuorumCert(self)
    }
}

/// Ask a peer for the chain of certified blocks extending the anchor block identified by hash
/// and number.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct GetQCBlockList {
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
}

impl Into<SyncMessage> for GetQCBlockList {
    fn into(self) -> SyncMessage {
        SyncMessage::GetQCBlockList(self)
    }
}

/// Response to [GetQCBlockList]: blocks paired position-wise with their quorum certificates.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct QCBlockList {
    pub blocks: Vec<Block>,
    pub qcs: Vec<QuorumCertificate>,
}

impl Into<SyncMessage> for QCBlockList {
    fn into(self) -> SyncMessage {
        SyncMessage::QCBlockList(self)
    }
}

/// Ask a peer for the prepare-votes it holds for `block_index`, restricted to the validators
/// whose bits are set in `unknown_set`.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct GetPrepareVote {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_index: BlockIndex,
    pub unknown_set: BitArray,
}

impl Into<SyncMessage> for GetPrepareVote {
    fn into(self) -> SyncMessage {
        SyncMessage::GetPrepareVote(self)
    }
}

/// Response to [GetPrepareVote].
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct PrepareVotes {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_index: BlockIndex,
    pub votes: Vec<PrepareVote>,
}

impl Into<SyncMessage> for PrepareVotes {
    fn into(self) -> SyncMessage {
        SyncMessage::PrepareVotes(self)
    }
}

/// Ask a peer to compare its chain head on the given logic channel with ours.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct GetLatestStatus {
    pub block_number: BlockNumber,
    pub block_hash: CryptoHash,
    pub logic_type: LogicType,
}

impl Into<SyncMessage> for GetLatestStatus {
    fn into(self) -> SyncMessage {
        SyncMessage::GetLatestStatus(self)
    }
}

/// Response to [GetLatestStatus], sent when the responder is ahead of the requester.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct LatestStatus {
    pub block_number: BlockNumber,
    pub block_hash: CryptoHash,
    pub logic_type: LogicType,
}

impl Into<SyncMessage> for LatestStatus {
    fn into(self) -> SyncMessage {
        SyncMessage::LatestStatus(self)
    }
}

/// Ask a peer for the view-change attestations of the validators whose bits are set in
/// `view_change_bits`, for the view `(epoch, view_number)`.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct GetViewChange {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub view_change_bits: BitArray,
}

impl Into<SyncMessage> for GetViewChange {
    fn into(self) -> SyncMessage {
        SyncMessage::GetViewChange(self)
    }
}

/// Response to [GetViewChange] when the responder is still in the requested view.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct ViewChanges {
    pub view_changes: Vec<ViewChange>,
}

impl Into<SyncMessage> for ViewChanges {
    fn into(self) -> SyncMessage {
        SyncMessage::ViewChanges(self)
    }
}

/// Response to [GetViewChange] when the responder has already advanced past the requested view.
#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct ViewChangeQuorumCert {
    pub view_change_qc: ViewChangeQC,
}

impl Into<SyncMessage> for ViewChangeQuorumCert {
    fn into(self) -> SyncMessage {
        SyncMessage::ViewChangeQuorumCert(self)
    }
}
