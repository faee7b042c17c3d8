/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The catch-up subprotocol: gap detection, request/response correlation, admission-controlled
//! response construction, and the serialized application of verified results to consensus state.
//!
//! ## Catch-up protocol
//!
//! A node that falls behind its peers — missing a block, a quorum certificate, a set of
//! prepare-votes, or a view-change certificate — discovers the gap from inbound traffic or from
//! the [missing-item detectors](process::Synchronizer::missing_prepare_vote), requests the
//! missing artifact from a specific peer, correlates the asynchronous response, verifies it
//! through the [bridge](crate::bridge::Bridge), and splices it into local consensus state
//! through the [single-writer executor](crate::state::StateWriterHandle).
//!
//! Three rules keep this safe against out-of-order and byzantine input:
//! 1. Every inbound artifact is admission-checked against the local `(epoch, view_number)`
//!    before it is considered at all.
//! 2. At most one ranged block fetch is outstanding system-wide, enforced by the
//!    [fetcher](fetcher::BlockFetcher)'s single task slot.
//! 3. Consensus state is only ever mutated by closures queued onto the single-writer executor;
//!    handlers themselves never touch it.

use std::fmt::{self, Display, Formatter};

use crate::bridge::VerifyError;
use crate::network::PeerNotConnected;

pub(crate) mod cache;

pub(crate) mod fetcher;

pub(crate) mod latency;

pub mod process;

/// Why a sync handler declined to act on a message.
///
/// Only [SyncError::AuthFailed] is attributable to the peer; every other variant is a benign
/// state mismatch that the caller's periodic gap detection will resolve naturally. Callers
/// decide whether to penalize the sending peer by checking [SyncError::auth_failed].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The message's `(epoch, view_number)` does not equal the local node's.
    MismatchedView,
    /// The block the message refers to is already certified locally.
    BlockAlreadyExists,
    /// The block the message refers to is not held locally.
    BlockNotFound,
    /// The requester is too far behind (or not behind at all) for a ranged block response to
    /// help it.
    PeerStateTooLow,
    /// A view-change request that fits none of the dispatch cases: cross-epoch or out of range.
    NotMatchLocalView,
    /// The retained view-change quorum certificate does not cover the requested view. This is a
    /// local-consistency failure, not a peer failure.
    ViewChangeQCMismatch,
    /// A block query carried the zero hash.
    InvalidBlockHash,
    /// The transport no longer holds a connection to the peer.
    PeerNotConnected,
    /// A certificate or vote failed cryptographic verification.
    AuthFailed(VerifyError),
}

impl SyncError {
    /// Whether this error is peer-attributable: the sending peer handed us cryptographic
    /// material that failed verification.
    pub fn auth_failed(&self) -> bool {
        matches!(self, SyncError::AuthFailed(_))
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::MismatchedView => write!(f, "message does not match the current view"),
            SyncError::BlockAlreadyExists => write!(f, "block already exists"),
            SyncError::BlockNotFound => write!(f, "block does not exist"),
            SyncError::PeerStateTooLow => write!(f, "peer state too low"),
            SyncError::NotMatchLocalView => {
                write!(f, "request does not match the local view")
            }
            SyncError::ViewChangeQCMismatch => {
                write!(f, "view change quorum certificate does not match the requested view")
            }
            SyncError::InvalidBlockHash => write!(f, "invalid block hash"),
            SyncError::PeerNotConnected => write!(f, "peer is not connected"),
            SyncError::AuthFailed(err) => write!(f, "authentication failed: {}", err),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<PeerNotConnected> for SyncError {
    fn from(_: PeerNotConnected) -> SyncError {
        SyncError::PeerNotConnected
    }
}
