/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Interfaces to the consensus state and chain storage collaborators, and the serialized
//! executor through which every consensus-state mutation flows.
//!
//! ## Single-writer discipline
//!
//! The consensus state object tolerates exactly one concurrent mutator. Queries
//! ([StateView]/[ChainView]) are safe for concurrent readers and may be called from any handler
//! context; mutations ([StateWriter]) are only ever performed by the executor thread spawned by
//! [start_state_executor], which owns the sole writer and runs submitted closures one at a
//! time, in submission order.
//!
//! Callers that need a mutation's result synchronously submit a closure together with a
//! completion channel and block on it ([StateWriterHandle::call]). There is no timeout on this
//! wait: the executor is assumed to outlive every caller.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ed25519_dalek::VerifyingKey;

use crate::sync::SyncError;
use crate::types::{
    basic::{BlockIndex, BlockNumber, CryptoHash, Epoch, ValidatorIndex, ViewNumber},
    block::Block,
    certificates::{PrepareVote, QuorumCertificate, ViewChange, ViewChangeQC},
};
use crate::messages::PrepareBlock;

/// The view number every epoch opens with.
pub const DEFAULT_VIEW_NUMBER: ViewNumber = ViewNumber::init();

/// Query surface of the consensus state object. Implementations must be safe for concurrent
/// readers while the [executor thread](start_state_executor) mutates the state.
pub trait StateView: Send + Sync {
    fn epoch(&self) -> Epoch;

    fn view_number(&self) -> ViewNumber;

    /// The block certified by the highest quorum certificate known locally.
    fn highest_qc_block(&self) -> Block;

    /// The highest locked block.
    fn highest_lock_block(&self) -> Block;

    /// The highest committed block.
    fn highest_commit_block(&self) -> Block;

    /// The block proposed at the given index of the current view, together with its quorum
    /// certificate if one has formed.
    fn view_block_and_qc(&self, block_index: BlockIndex)
        -> (Option<Block>, Option<QuorumCertificate>);

    fn view_block_by_index(&self, block_index: BlockIndex) -> Option<Block>;

    /// The prepare-block message stored for the given index of the current view.
    fn prepare_block_by_index(&self, block_index: BlockIndex) -> Option<PrepareBlock>;

    /// All prepare-votes held for the given block index, keyed by validator index.
    fn prepare_votes_by_index(
        &self,
        block_index: BlockIndex,
    ) -> HashMap<ValidatorIndex, PrepareVote>;

    fn prepare_vote_len_by_index(&self, block_index: BlockIndex) -> usize;

    /// All view-change attestations held for the current view, keyed by validator index.
    fn all_view_changes(&self) -> HashMap<ValidatorIndex, ViewChange>;

    /// The most recently retained view-change quorum certificate.
    fn last_view_change_qc(&self) -> Option<ViewChangeQC>;

    /// The highest block index of the current view that already has a quorum certificate, or
    /// `None` if no index does.
    fn max_qc_index(&self) -> Option<BlockIndex>;

    /// The first block index of the current view that has not been assigned a proposal yet.
    fn next_view_block_index(&self) -> BlockIndex;

    /// Whether the current view's view-change deadline has elapsed.
    fn is_deadline_expired(&self) -> bool;

    /// Cardinality of the current validator set.
    fn validator_len(&self) -> usize;

    /// Minimum attester count required to consider an artifact quorum-valid, for a validator
    /// set of size `n`.
    fn quorum_threshold(&self, n: usize) -> usize;
}

/// Query surface of the chain/block-tree collaborator.
pub trait ChainView: Send + Sync {
    /// Look up a block and its quorum certificate by hash and number. Returns `None` if the
    /// block is unknown or not yet certified.
    fn find_block_and_qc(
        &self,
        block_hash: &CryptoHash,
        block_number: BlockNumber,
    ) -> Option<(Block, QuorumCertificate)>;

    /// Look up a block in chain storage by hash and number.
    fn block_by_hash_and_number(
        &self,
        block_hash: &CryptoHash,
        block_number: BlockNumber,
    ) -> Option<Block>;
}

/// Mutation surface of the consensus state object. The sole implementor instance is owned by
/// the executor thread; nothing else may call these methods.
pub trait StateWriter: StateView + ChainView {
    /// Insert a verified, executed chain of blocks and their quorum certificates as one atomic
    /// update.
    fn insert_block_list(
        &mut self,
        blocks: Vec<Block>,
        qcs: Vec<QuorumCertificate>,
    ) -> Result<(), SyncError>;

    /// Insert a verified quorum certificate for a block of the current view.
    fn insert_prepare_qc(&mut self, qc: QuorumCertificate);

    /// Run a prepare-vote through the normal vote-acceptance path.
    fn accept_prepare_vote(
        &mut self,
        origin: VerifyingKey,
        vote: PrepareVote,
    ) -> Result<(), SyncError>;

    /// Run a view-change attestation through the normal view-change-acceptance path.
    fn accept_view_change(
        &mut self,
        origin: VerifyingKey,
        view_change: ViewChange,
    ) -> Result<(), SyncError>;

    /// Attempt a view transition driven by a verified view-change quorum certificate.
    fn advance_view_by_qc(&mut self, qc: ViewChangeQC);
}

type StateCommand = Box<dyn FnOnce(&mut dyn StateWriter) + Send>;

/// Cloneable handle for enqueueing mutation closures onto the executor thread.
#[derive(Clone)]
pub struct StateWriterHandle {
    commands: Sender<StateCommand>,
}

impl StateWriterHandle {
    /// Enqueue a mutation closure without waiting for it to run.
    pub fn submit(&self, command: impl FnOnce(&mut dyn StateWriter) + Send + 'static) {
        self.commands
            .send(Box::new(command))
            .expect("State executor disconnected from callers")
    }

    /// Enqueue a closure and block until the executor thread has run it, returning its result.
    pub fn call<T: Send + 'static>(
        &self,
        command: impl FnOnce(&mut dyn StateWriter) -> T + Send + 'static,
    ) -> T {
        let (result_sender, result) = mpsc::channel();
        self.submit(move |state| {
            let _ = result_sender.send(command(state));
        });
        result
            .recv()
            .expect("State executor disconnected from callers")
    }
}

/// Spawn the executor thread that owns the sole [StateWriter] and processes submitted closures
/// in submission order.
pub fn start_state_executor(
    mut writer: Box<dyn StateWriter>,
    shutdown_signal: Receiver<()>,
) -> (StateWriterHandle, JoinHandle<()>) {
    let (command_sender, commands) = mpsc::channel::<StateCommand>();

    let executor = thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => return,
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("State executor disconnected from main thread")
            }
        }

        match commands.recv_timeout(Duration::from_millis(50)) {
            Ok(command) => command(writer.as_mut()),
            Err(RecvTimeoutError::Timeout) => thread::yield_now(),
            Err(RecvTimeoutError::Disconnected) => return,
        }
    });

    (
        StateWriterHandle {
            commands: command_sender,
        },
        executor,
    )
}
