/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for votes, view changes, and the certificates they aggregate into.
//!
//! The cryptographic material in these types is opaque to this crate: producing and verifying
//! it is the job of the [bridge](crate::bridge::Bridge) collaborator. What this crate does care
//! about is the epoch/view scope every certificate carries, because a certificate is only
//! meaningful within the view that produced it.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::basic::*;

/// Proof that a quorum of validators voted for a block. Valid only within the
/// `(epoch, view_number)` that produced it.
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct QuorumCertificate {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
    pub block_index: BlockIndex,
    pub signatures: SignatureSet,
}

/// A single validator's vote for a candidate block. Within a view, votes are keyed uniquely by
/// `(block_index, validator_index)`.
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PrepareVote {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
    pub block_index: BlockIndex,
    pub validator_index: ValidatorIndex,
    pub signature: SignatureBytes,
}

/// A single validator's attestation that the current view should be abandoned and advanced.
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ViewChange {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
    pub validator_index: ValidatorIndex,
    pub signature: SignatureBytes,
}

/// One aggregated view-change attestation: the validators marked in `validator_set` attested to
/// advancing past `(epoch, view_number)` on top of the given block.
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ViewChangeCert {
    pub epoch: Epoch,
    pub view_number: ViewNumber,
    pub block_hash: CryptoHash,
    pub block_number: BlockNumber,
    pub validator_set: BitArray,
    pub signature: SignatureBytes,
}

/// Proof that a quorum of validators attested to a view change. Validators may have attested on
/// top of different blocks, so the proof is a list of [ViewChangeCert]s, one per distinct block.
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ViewChangeQC {
    pub certs: Vec<ViewChangeCert>,
}

impl ViewChangeQC {
    /// Returns the `(epoch, view_number, block_hash, block_number)` of the entry with the highest
    /// block number, or `None` if the certificate is empty.
    pub fn max_block(&self) -> Option<(Epoch, ViewNumber, CryptoHash, BlockNumber)> {
        self.certs
            .iter()
            .max_by_key(|cert| cert.block_number)
            .map(|cert| (cert.epoch, cert.view_number, cert.block_hash, cert.block_number))
    }

    /// Whether every entry of the certificate is scoped to the given `(epoch, view_number)`.
    /// An empty certificate matches nothing.
    pub fn equal_all(&self, epoch: Epoch, view_number: ViewNumber) -> bool {
        !self.certs.is_empty()
            && self
                .certs
                .iter()
                .all(|cert| cert.epoch == epoch && cert.view_number == view_number)
    }
}
