/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Handlers for every wire message of the catch-up protocol, the ranged block fetch built on
//! top of the [fetcher](super::fetcher), and the missing-item detectors driven by a periodic
//! external loop.
//!
//! Every handler follows the same shape: admission-check the message against current consensus
//! state, then either build and send a response, or verify inbound data and queue its
//! integration onto the single-writer state executor. Handlers read state directly through the
//! concurrent-reader query surface; they never mutate it themselves.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use ed25519_dalek::VerifyingKey;

use crate::bridge::Bridge;
use crate::config::SyncConfiguration;
use crate::logging::{debug, error, trace};
use crate::messages::{
    BlockQuorumCert, GetBlockQuorumCert, GetLatestStatus, GetPrepareBlock, GetPrepareVote,
    GetQCBlockList, GetViewChange, LatestStatus, LogicType, PrepareBlock, PrepareBlockHash,
    PrepareVotes, QCBlockList, SyncMessage, ViewChangeQuorumCert, ViewChanges,
};
use crate::network::Network;
use crate::state::{ChainView, StateView, StateWriterHandle, DEFAULT_VIEW_NUMBER};
use crate::sync::cache::{CacheKey, SyncCache};
use crate::sync::fetcher::{
    start_fetch_monitor, BlockFetcher, ExecutorFn, ExpireFn, FetchTask, MatchFn,
};
use crate::sync::latency::{LatencyTracker, DEFAULT_AVG_LATENCY_MILLIS};
use crate::sync::SyncError;
use crate::types::basic::{BitArray, BlockIndex, BlockNumber, CryptoHash, Epoch, ValidatorIndex, ViewNumber};
use crate::types::certificates::PrepareVote;

/// A responder may serve a ranged block request from at most this far ahead of the requester's
/// anchor.
const MAX_QC_BLOCK_LIST_GAP: u64 = 3;

/// The catch-up subsystem. One instance lives on the message-dispatch context; the transport
/// layer feeds it inbound messages through [Synchronizer::handle_message], and a periodic
/// driver polls the [missing-item detectors](Synchronizer::missing_prepare_vote).
pub struct Synchronizer<N: Network> {
    config: SyncConfiguration,
    network: N,
    state: Arc<dyn StateView>,
    chain: Arc<dyn ChainView>,
    state_writer: StateWriterHandle,
    bridge: Arc<dyn Bridge>,
    fetcher: Arc<BlockFetcher>,
    syncing_cache: SyncCache,
    latency: LatencyTracker,
}

impl<N: Network> Synchronizer<N> {
    /// Create the synchronizer and spawn the monitor thread that expires stale fetch tasks. The
    /// monitor runs until a shutdown signal arrives on `shutdown_signal`.
    pub fn start(
        config: SyncConfiguration,
        network: N,
        state: Arc<dyn StateView>,
        chain: Arc<dyn ChainView>,
        state_writer: StateWriterHandle,
        bridge: Arc<dyn Bridge>,
        shutdown_signal: Receiver<()>,
    ) -> (Synchronizer<N>, JoinHandle<()>) {
        let fetcher = Arc::new(BlockFetcher::new());
        let fetch_monitor = start_fetch_monitor(fetcher.clone(), shutdown_signal);

        let synchronizer = Synchronizer {
            syncing_cache: SyncCache::new(config.syncing_cache_ttl),
            config,
            network,
            state,
            chain,
            state_writer,
            bridge,
            fetcher,
            latency: LatencyTracker::new(),
        };

        (synchronizer, fetch_monitor)
    }

    /// Route an inbound message to its handler.
    ///
    /// [QCBlockList] responses go to the fetcher: one with no outstanding matching task is
    /// dropped. [PrepareBlock] and [PrepareVote] are ordinary progress traffic whose consensus
    /// processing happens elsewhere; this crate only inspects them for gaps.
    pub fn handle_message(
        &mut self,
        origin: VerifyingKey,
        message: SyncMessage,
    ) -> Result<(), SyncError> {
        debug::received_message(message.kind(), &origin);
        match message {
            SyncMessage::GetPrepareBlock(msg) => self.on_get_prepare_block(origin, msg),
            SyncMessage::PrepareBlock(msg) => {
                self.prepare_block_fetch_rules(origin, &msg);
                Ok(())
            }
            SyncMessage::PrepareBlockHash(msg) => self.on_prepare_block_hash(origin, msg),
            SyncMessage::GetBlockQuorumCert(msg) => self.on_get_block_quorum_cert(origin, msg),
            SyncMessage::BlockQuorumCert(msg) => self.on_block_quorum_cert(origin, msg),
            SyncMessage::GetQCBlockList(msg) => self.on_get_qc_block_list(origin, msg),
            SyncMessage::QCBlockList(_) => {
                if let Some(unmatched) = self.fetcher.try_execute(&origin, message) {
                    trace::unmatched_response(unmatched.kind());
                }
                Ok(())
            }
            SyncMessage::GetPrepareVote(msg) => self.on_get_prepare_vote(origin, msg),
            SyncMessage::PrepareVotes(msg) => self.on_prepare_votes(origin, msg),
            SyncMessage::PrepareVote(msg) => {
                self.prepare_vote_fetch_rules(origin, &msg);
                Ok(())
            }
            SyncMessage::GetLatestStatus(msg) => self.on_get_latest_status(origin, msg),
            SyncMessage::LatestStatus(msg) => self.on_latest_status(origin, msg),
            SyncMessage::GetViewChange(msg) => self.on_get_view_change(origin, msg),
            SyncMessage::ViewChanges(msg) => self.on_view_changes(origin, msg),
            SyncMessage::ViewChangeQuorumCert(msg) => {
                self.on_view_change_quorum_cert(origin, msg)
            }
        }
    }

    /// Request the chain of certified blocks a peer holds beyond ours.
    ///
    /// The request is anchored at our highest-QC block when the peer is strictly ahead, or at
    /// our highest-locked block when it advertises the same number (the heads may differ). A
    /// peer at or below the anchor has nothing we need. No-op while a fetch is already
    /// outstanding: the single fetch slot is never re-armed and the incumbent's deadline never
    /// reset.
    ///
    /// The response is validated as a whole before any of it is applied: every block must
    /// extend the previous accepted block, carry a quorum certificate that verifies against its
    /// `(number, hash)`, and execute on top of its parent. The first failure discards the
    /// entire response.
    pub fn fetch_block(&mut self, peer: VerifyingKey, block_number: BlockNumber) {
        if self.fetcher.len() != 0 {
            trace::had_fetching_block();
            return;
        }

        let highest_qc = self.state.highest_qc_block();
        let anchor = if highest_qc.number < block_number {
            highest_qc
        } else if highest_qc.number == block_number {
            self.state.highest_lock_block()
        } else {
            trace::no_suitable_block(block_number);
            return;
        };

        let matcher: MatchFn =
            Box::new(|message| matches!(message, SyncMessage::QCBlockList(_)));

        let bridge = self.bridge.clone();
        let state_writer = self.state_writer.clone();
        let base_block = anchor.clone();
        let executor: ExecutorFn = Box::new(move |message| {
            if let SyncMessage::QCBlockList(QCBlockList { blocks, qcs }) = message {
                if blocks.len() != qcs.len() {
                    debug::response_length_mismatch(blocks.len(), qcs.len());
                    return;
                }

                let mut parent = base_block;
                for (block, qc) in blocks.iter().zip(qcs.iter()) {
                    if block.parent_hash != parent.hash {
                        debug::response_chain_broken(&block.hash, block.number, &parent.hash);
                        return;
                    }
                    if let Err(err) = bridge.verify_prepare_qc(block.number, block.hash, qc) {
                        error::verify_qc_failed(&block.hash, block.number, &err);
                        return;
                    }
                    if let Err(err) = bridge.execute_block(block, &parent) {
                        error::execute_block_failed(&block.hash, block.number, &err);
                        return;
                    }
                    parent = block.clone();
                }

                state_writer.submit(move |state| {
                    if let Err(err) = state.insert_block_list(blocks, qcs) {
                        error::insert_blocks_failed(&err)
                    }
                });
            }
        });

        let expire: ExpireFn = Box::new(move || debug::fetch_timeout(&peer));

        debug::start_fetching(&peer, &anchor.hash, anchor.number);

        let registered = self.fetcher.add_task(FetchTask {
            peer,
            matcher,
            executor,
            expire,
            deadline: Instant::now() + self.config.fetch_timeout,
        });
        if !registered {
            trace::had_fetching_block();
            return;
        }

        self.network
            .send(peer, SyncMessage::get_qc_block_list(anchor.hash, anchor.number));
    }

    /// Request the prepare-block at `block_index` from `peer`, unless an identical request is
    /// still inside its dedup window.
    pub fn sync_prepare_block(
        &mut self,
        peer: VerifyingKey,
        epoch: Epoch,
        view_number: ViewNumber,
        block_index: BlockIndex,
    ) {
        if self.syncing_cache.add_or_replace(CacheKey::Index(block_index)) {
            debug::send_message(&peer, "GetPrepareBlock");
            self.network
                .send(peer, SyncMessage::get_prepare_block(epoch, view_number, block_index));
        }
    }

    /// Request a block's quorum certificate from `peer`, unless an identical request is still
    /// inside its dedup window.
    pub fn sync_block_quorum_cert(
        &mut self,
        peer: VerifyingKey,
        block_number: BlockNumber,
        block_hash: CryptoHash,
    ) {
        if self.syncing_cache.add_or_replace(CacheKey::Hash(block_hash)) {
            debug::send_message(&peer, "GetBlockQuorumCert");
            self.network
                .send(peer, SyncMessage::get_block_quorum_cert(block_hash, block_number));
        }
    }

    /// A proposal beyond our highest-QC block reveals which earlier view slots we are missing:
    /// request each empty slot before the proposal's index.
    pub fn prepare_block_fetch_rules(&mut self, peer: VerifyingKey, msg: &PrepareBlock) {
        if msg.block.number > self.state.highest_qc_block().number {
            for i in 0..msg.block_index.int() {
                let block_index = BlockIndex::new(i);
                let (block, _) = self.state.view_block_and_qc(block_index);
                if block.is_none() {
                    self.sync_prepare_block(
                        peer,
                        self.state.epoch(),
                        self.state.view_number(),
                        block_index,
                    );
                }
            }
        }
    }

    /// A vote more than one block past our highest-QC block means we are missing blocks or
    /// certificates before it: request whichever is absent for each earlier slot.
    pub fn prepare_vote_fetch_rules(&mut self, peer: VerifyingKey, vote: &PrepareVote) {
        if vote.block_number > self.state.highest_qc_block().number + 1 {
            for i in 0..vote.block_index.int() {
                let block_index = BlockIndex::new(i);
                match self.state.view_block_and_qc(block_index) {
                    (None, _) => self.sync_prepare_block(
                        peer,
                        self.state.epoch(),
                        self.state.view_number(),
                        block_index,
                    ),
                    (Some(block), None) => {
                        self.sync_block_quorum_cert(peer, block.number, block.hash)
                    }
                    _ => (),
                }
            }
        }
    }

    /// Serve a peer's request for a prepare-block of the current view.
    pub fn on_get_prepare_block(
        &mut self,
        origin: VerifyingKey,
        msg: GetPrepareBlock,
    ) -> Result<(), SyncError> {
        if msg.epoch == self.state.epoch() && msg.view_number == self.state.view_number() {
            if let Some(prepare_block) = self.state.prepare_block_by_index(msg.block_index) {
                debug::send_message(&origin, "PrepareBlock");
                self.network.send(origin, SyncMessage::PrepareBlock(prepare_block));
            }
        }
        Ok(())
    }

    /// Serve a peer's request for the quorum certificate of a block we hold.
    pub fn on_get_block_quorum_cert(
        &mut self,
        origin: VerifyingKey,
        msg: GetBlockQuorumCert,
    ) -> Result<(), SyncError> {
        if let Some((_, block_qc)) = self.chain.find_block_and_qc(&msg.block_hash, msg.block_number)
        {
            debug::send_message(&origin, "BlockQuorumCert");
            self.network
                .send(origin, SyncMessage::BlockQuorumCert(BlockQuorumCert { block_qc }));
        }
        Ok(())
    }

    /// Integrate a quorum certificate a peer sent for a block of the current view.
    ///
    /// The certificate must be scoped to the current view, must not duplicate one we already
    /// hold, and must verify against the block we hold at its index. A verification failure is
    /// peer-attributable.
    pub fn on_block_quorum_cert(
        &mut self,
        _origin: VerifyingKey,
        msg: BlockQuorumCert,
    ) -> Result<(), SyncError> {
        let block_qc = msg.block_qc;
        if block_qc.epoch != self.state.epoch()
            || block_qc.view_number != self.state.view_number()
        {
            debug::mismatched_view("BlockQuorumCert", block_qc.epoch, block_qc.view_number);
            return Err(SyncError::MismatchedView);
        }

        if self
            .chain
            .find_block_and_qc(&block_qc.block_hash, block_qc.block_number)
            .is_some()
        {
            return Err(SyncError::BlockAlreadyExists);
        }

        // If the certificate is genuine, the block it certifies must already be here.
        let block = self
            .state
            .view_block_by_index(block_qc.block_index)
            .ok_or(SyncError::BlockNotFound)?;
        if let Err(err) = self.bridge.verify_prepare_qc(block.number, block.hash, &block_qc) {
            return Err(SyncError::AuthFailed(err));
        }

        self.state_writer.submit(move |state| state.insert_prepare_qc(block_qc));
        Ok(())
    }

    /// Serve a ranged block request by assembling the commit/lock/highest-QC chain extending
    /// the requester's anchor.
    ///
    /// A requester more than [MAX_QC_BLOCK_LIST_GAP] blocks behind is beyond what this chain
    /// can catch up, and one whose anchor equals our highest-QC block needs nothing; both are
    /// refused. Each of {commit, lock, highest-QC} is included only if it chains from the
    /// anchor directly or through the blocks included before it.
    pub fn on_get_qc_block_list(
        &mut self,
        origin: VerifyingKey,
        msg: GetQCBlockList,
    ) -> Result<(), SyncError> {
        let highest_qc = self.state.highest_qc_block();

        if highest_qc.number > msg.block_number + MAX_QC_BLOCK_LIST_GAP
            || (highest_qc.hash == msg.block_hash && highest_qc.number == msg.block_number)
        {
            debug::peer_state_too_low(highest_qc.number, msg.block_number);
            return Err(SyncError::PeerStateTooLow);
        }

        let lock = self.state.highest_lock_block();
        let commit = self.state.highest_commit_block();

        let mut blocks = Vec::new();
        let mut qcs = Vec::new();

        if commit.parent_hash == msg.block_hash {
            if let Some((block, qc)) = self.chain.find_block_and_qc(&commit.hash, commit.number) {
                blocks.push(block);
                qcs.push(qc);
            }
        }
        if lock.parent_hash == msg.block_hash || commit.parent_hash == msg.block_hash {
            if let Some((block, qc)) = self.chain.find_block_and_qc(&lock.hash, lock.number) {
                blocks.push(block);
                qcs.push(qc);
            }
        }
        if highest_qc.parent_hash == msg.block_hash
            || lock.parent_hash == msg.block_hash
            || commit.parent_hash == msg.block_hash
        {
            if let Some((block, qc)) =
                self.chain.find_block_and_qc(&highest_qc.hash, highest_qc.number)
            {
                blocks.push(block);
                qcs.push(qc);
            }
        }

        if !qcs.is_empty() {
            debug::send_message(&origin, "QCBlockList");
            self.network.send(origin, SyncMessage::qc_block_list(blocks, qcs));
        }
        Ok(())
    }

    /// Serve a peer's request for the prepare-votes it is missing, masked by the validator
    /// bitmap it sent.
    pub fn on_get_prepare_vote(
        &mut self,
        origin: VerifyingKey,
        msg: GetPrepareVote,
    ) -> Result<(), SyncError> {
        if msg.epoch == self.state.epoch() && msg.view_number == self.state.view_number() {
            let votes: Vec<PrepareVote> = self
                .state
                .prepare_votes_by_index(msg.block_index)
                .into_iter()
                .filter(|(validator_index, _)| msg.unknown_set.get_index(validator_index.int()))
                .map(|(_, vote)| vote)
                .collect();

            if !votes.is_empty() {
                debug::send_message(&origin, "PrepareVotes");
                self.network.send(
                    origin,
                    SyncMessage::prepare_votes(msg.epoch, msg.view_number, msg.block_index, votes),
                );
            }
        }
        Ok(())
    }

    /// Replay a batch of prepare-votes through the normal vote-acceptance path, in order. The
    /// first failure stops the batch; later votes are not skipped past it.
    pub fn on_prepare_votes(
        &mut self,
        origin: VerifyingKey,
        msg: PrepareVotes,
    ) -> Result<(), SyncError> {
        for vote in msg.votes {
            let result = self
                .state_writer
                .call(move |state| state.accept_prepare_vote(origin, vote));
            if let Err(err) = result {
                if err.auth_failed() {
                    error::replay_failed("PrepareVotes", &origin, &err);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Compare a peer's advertised chain head against ours: register it and start fetching if
    /// we are behind, reply with our own status if we are ahead.
    pub fn on_get_latest_status(
        &mut self,
        origin: VerifyingKey,
        msg: GetLatestStatus,
    ) -> Result<(), SyncError> {
        if msg.logic_type != LogicType::QCBlock {
            return Ok(());
        }

        let local = self.state.highest_qc_block();
        if local.number == msg.block_number && local.hash == msg.block_hash {
            trace::status_equal(msg.block_number, local.number);
            return Ok(());
        }
        if local.number < msg.block_number
            || (local.number == msg.block_number && local.hash != msg.block_hash)
        {
            debug::status_behind(msg.block_number, local.number);
            return self.register_peer_and_fetch(origin, msg.logic_type, msg.block_number);
        }

        debug::status_ahead(msg.block_number, local.number);
        debug::send_message(&origin, "LatestStatus");
        self.network
            .send(origin, SyncMessage::latest_status(local.number, local.hash, msg.logic_type));
        Ok(())
    }

    /// A peer replied that it is ahead of us: register its head and start fetching.
    pub fn on_latest_status(
        &mut self,
        origin: VerifyingKey,
        msg: LatestStatus,
    ) -> Result<(), SyncError> {
        match msg.logic_type {
            LogicType::QCBlock => {
                let local = self.state.highest_qc_block();
                if local.number < msg.block_number
                    || (local.number == msg.block_number && local.hash != msg.block_hash)
                {
                    debug::status_behind(msg.block_number, local.number);
                    return self.register_peer_and_fetch(origin, msg.logic_type, msg.block_number);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn register_peer_and_fetch(
        &mut self,
        peer: VerifyingKey,
        logic_type: LogicType,
        block_number: BlockNumber,
    ) -> Result<(), SyncError> {
        if let Err(err) = self.network.set_peer_block_number(peer, logic_type, block_number) {
            error::set_peer_block_number_failed(&peer, &err);
            return Err(err.into());
        }
        self.fetch_block(peer, block_number);
        Ok(())
    }

    /// A peer announced a block of the current view that we do not hold: drop the transport's
    /// seen-marker for the announcement so it can reach us again, and request the full block.
    pub fn on_prepare_block_hash(
        &mut self,
        origin: VerifyingKey,
        msg: PrepareBlockHash,
    ) -> Result<(), SyncError> {
        if msg.epoch == self.state.epoch() && msg.view_number == self.state.view_number() {
            if self.state.view_block_by_index(msg.block_index).is_none() {
                let message_hash = SyncMessage::PrepareBlockHash(msg.clone()).msg_hash();
                self.network.remove_message_hash(origin, message_hash);
                self.sync_prepare_block(origin, msg.epoch, msg.view_number, msg.block_index);
            }
        }
        Ok(())
    }

    /// Serve a peer's view-change request. The requester's `(epoch, view_number)` falls into
    /// exactly one of three cases:
    ///
    /// 1. Equal to our current view: send the view-changes we hold for the validators it asked
    ///    for.
    /// 2. Exactly one view behind (including the epoch-rollover form, where the requester's
    ///    epoch precedes ours and our view is still [DEFAULT_VIEW_NUMBER]): send the
    ///    view-change quorum certificate retained from the last transition.
    /// 3. More than one view behind within our epoch: look the certificate up in the
    ///    write-ahead log.
    ///
    /// Anything else — cross-epoch or out of range — is refused.
    pub fn on_get_view_change(
        &mut self,
        origin: VerifyingKey,
        msg: GetViewChange,
    ) -> Result<(), SyncError> {
        let local_epoch = self.state.epoch();
        let local_view_number = self.state.view_number();

        let is_equal_local_view =
            msg.view_number == local_view_number && msg.epoch == local_epoch;
        let is_last_view = msg.view_number + 1 == local_view_number
            || (msg.epoch + 1 == local_epoch && local_view_number == DEFAULT_VIEW_NUMBER);
        let is_previous_view =
            msg.epoch == local_epoch && msg.view_number + 1 < local_view_number;

        if is_equal_local_view {
            let view_changes: Vec<_> = self
                .state
                .all_view_changes()
                .into_iter()
                .filter(|(validator_index, _)| {
                    msg.view_change_bits.get_index(validator_index.int())
                })
                .map(|(_, view_change)| view_change)
                .collect();

            if !view_changes.is_empty() {
                debug::send_message(&origin, "ViewChanges");
                self.network.send(origin, SyncMessage::view_changes(view_changes));
            }
            return Ok(());
        }

        if is_last_view {
            let view_change_qc = match self.state.last_view_change_qc() {
                Some(qc) => qc,
                None => {
                    error::last_view_change_qc_missing();
                    return Ok(());
                }
            };
            // The retained certificate not covering the requested view is a local-consistency
            // failure, not something to send to the peer.
            if !view_change_qc.equal_all(msg.epoch, msg.view_number) {
                let err = SyncError::ViewChangeQCMismatch;
                error::last_view_change_qc_mismatch(&err);
                return Err(err);
            }
            debug::send_message(&origin, "ViewChangeQuorumCert");
            self.network.send(
                origin,
                SyncMessage::ViewChangeQuorumCert(ViewChangeQuorumCert { view_change_qc }),
            );
            return Ok(());
        }

        if is_previous_view {
            if let Some(view_change_qc) = self.bridge.view_change_qc(msg.epoch, msg.view_number)
            {
                debug::send_message(&origin, "ViewChangeQuorumCert");
                self.network.send(
                    origin,
                    SyncMessage::ViewChangeQuorumCert(ViewChangeQuorumCert { view_change_qc }),
                );
                return Ok(());
            }
        }

        Err(SyncError::NotMatchLocalView)
    }

    /// Integrate an aggregated view-change certificate: if it is scoped to our current view and
    /// verifies, drive a view transition with it.
    pub fn on_view_change_quorum_cert(
        &mut self,
        _origin: VerifyingKey,
        msg: ViewChangeQuorumCert,
    ) -> Result<(), SyncError> {
        let view_change_qc = msg.view_change_qc;
        if let Some((epoch, view_number, _, _)) = view_change_qc.max_block() {
            if self.state.epoch() == epoch && self.state.view_number() == view_number {
                if let Err(err) = self.bridge.verify_view_change_qc(&view_change_qc) {
                    error::verify_view_change_qc_failed(&err);
                    return Err(SyncError::AuthFailed(err));
                }
                self.state_writer
                    .submit(move |state| state.advance_view_by_qc(view_change_qc));
            }
        }
        Ok(())
    }

    /// Replay a batch of view-change attestations through the normal acceptance path, in order,
    /// stopping at the first failure.
    pub fn on_view_changes(
        &mut self,
        origin: VerifyingKey,
        msg: ViewChanges,
    ) -> Result<(), SyncError> {
        for view_change in msg.view_changes {
            let result = self
                .state_writer
                .call(move |state| state.accept_view_change(origin, view_change));
            if let Err(err) = result {
                if err.auth_failed() {
                    error::replay_failed("ViewChanges", &origin, &err);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Which validators' view-changes we still need for the current view, or `None` if a quorum
    /// is already held or the view's deadline has not elapsed yet.
    ///
    /// Runs as a closure on the state executor and blocks until it has, so the computed bitmap
    /// is consistent with a single point in time.
    pub fn missing_view_change_nodes(&self) -> Option<GetViewChange> {
        let request = self.state_writer.call(|state| {
            let all_view_changes = state.all_view_changes();
            let validator_len = state.validator_len();

            if all_view_changes.len() >= state.quorum_threshold(validator_len)
                || !state.is_deadline_expired()
            {
                return None;
            }

            let mut view_change_bits = BitArray::new(validator_len as u32);
            for i in 0..view_change_bits.size() {
                if !all_view_changes.contains_key(&ValidatorIndex::new(i)) {
                    view_change_bits.set_index(i, true);
                }
            }

            Some(GetViewChange {
                epoch: state.epoch(),
                view_number: state.view_number(),
                view_change_bits,
            })
        });

        if request.is_none() {
            debug::no_need_sync("view change");
        }
        request
    }

    /// A vote request for the first under-quorum block index of the current view, or `None` if
    /// every index between the highest certified and the next unassigned one has a quorum of
    /// votes already.
    pub fn missing_prepare_vote(&self) -> Option<GetPrepareVote> {
        let request = self.state_writer.call(|state| {
            let begin = state
                .max_qc_index()
                .map_or(BlockIndex::new(0), |index| index + 1);
            let end = state.next_view_block_index();
            let validator_len = state.validator_len();
            debug::missing_prepare_vote(
                state.epoch(),
                state.view_number(),
                begin,
                end,
                validator_len,
            );

            for i in begin.int()..end.int() {
                let block_index = BlockIndex::new(i);
                if state.prepare_vote_len_by_index(block_index)
                    < state.quorum_threshold(validator_len)
                {
                    let known_votes = state.prepare_votes_by_index(block_index);
                    let mut unknown_set = BitArray::new(validator_len as u32);
                    for v in 0..unknown_set.size() {
                        if !known_votes.contains_key(&ValidatorIndex::new(v)) {
                            unknown_set.set_index(v, true);
                        }
                    }

                    return Some(GetPrepareVote {
                        epoch: state.epoch(),
                        view_number: state.view_number(),
                        block_index,
                        unknown_set,
                    });
                }
            }
            None
        });

        if request.is_none() {
            debug::no_need_sync("prepare vote");
        }
        request
    }

    /// Whether a block with the given number and hash is held in chain storage.
    pub fn block_exists(
        &self,
        block_number: BlockNumber,
        block_hash: CryptoHash,
    ) -> Result<(), SyncError> {
        self.state_writer.call(move |state| {
            if block_hash == CryptoHash::zero() {
                return Err(SyncError::InvalidBlockHash);
            }
            match state.block_by_hash_and_number(&block_hash, block_number) {
                Some(block) if block.hash == block_hash && block.number == block_number => Ok(()),
                _ => Err(SyncError::BlockNotFound),
            }
        })
    }

    /// Record a round-trip sample for `peer`.
    pub fn on_pong(&self, peer: VerifyingKey, millis: u64) {
        trace::on_pong(&peer, millis);
        self.latency.on_pong(peer, millis);
    }

    /// The robust average latency across the connected consensus peers: the mean of the
    /// fastest two-thirds (at least one) of the peers that have samples, or zero when none do.
    pub fn avg_latency(&self) -> Duration {
        self.latency.avg_latency(&self.network.alive_consensus_peers())
    }

    /// The latency assumed before any samples have been collected.
    pub fn default_avg_latency() -> Duration {
        Duration::from_millis(DEFAULT_AVG_LATENCY_MILLIS)
    }
}
