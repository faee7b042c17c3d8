use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use ed25519_dalek::VerifyingKey;

use viewsync::bridge::VerifyError;
use viewsync::messages::PrepareBlock;
use viewsync::state::{ChainView, StateView, StateWriter};
use viewsync::sync::SyncError;
use viewsync::types::{
    basic::{BlockIndex, BlockNumber, CryptoHash, Epoch, ValidatorIndex, ViewNumber},
    block::Block,
    certificates::{PrepareVote, QuorumCertificate, ViewChange, ViewChangeQC},
};

use super::artifacts;

/// An in-memory consensus state implementing all three state traits. Tests script it through
/// [StateInner] and observe the mutations the synchronizer queues onto it.
#[derive(Clone)]
pub(crate) struct MockState {
    pub(crate) inner: Arc<Mutex<StateInner>>,
}

pub(crate) struct StateInner {
    pub(crate) epoch: Epoch,
    pub(crate) view_number: ViewNumber,
    pub(crate) highest_qc_block: Block,
    pub(crate) highest_lock_block: Block,
    pub(crate) highest_commit_block: Block,
    pub(crate) view_blocks: HashMap<BlockIndex, Block>,
    pub(crate) view_qcs: HashMap<BlockIndex, QuorumCertificate>,
    pub(crate) prepare_blocks: HashMap<BlockIndex, PrepareBlock>,
    pub(crate) prepare_votes: HashMap<BlockIndex, HashMap<ValidatorIndex, PrepareVote>>,
    pub(crate) view_changes: HashMap<ValidatorIndex, ViewChange>,
    pub(crate) last_view_change_qc: Option<ViewChangeQC>,
    pub(crate) next_view_block_index: BlockIndex,
    pub(crate) deadline_expired: bool,
    pub(crate) validator_len: usize,
    /// Chain storage: certified `(block, qc)` pairs served by `find_block_and_qc`.
    pub(crate) certified_chain: Vec<(Block, QuorumCertificate)>,
    /// Chain storage: blocks served by `block_by_hash_and_number`, looked up by hash.
    pub(crate) chain_blocks: Vec<Block>,

    // Mutations recorded by the StateWriter surface.
    pub(crate) inserted_block_lists: Vec<(Vec<Block>, Vec<QuorumCertificate>)>,
    pub(crate) inserted_prepare_qcs: Vec<QuorumCertificate>,
    pub(crate) accepted_votes: Vec<(VerifyingKey, PrepareVote)>,
    pub(crate) accepted_view_changes: Vec<(VerifyingKey, ViewChange)>,
    pub(crate) advanced_views: Vec<ViewChangeQC>,

    // Validators whose replayed votes/view-changes fail verification.
    pub(crate) reject_votes_from: HashSet<ValidatorIndex>,
    pub(crate) reject_view_changes_from: HashSet<ValidatorIndex>,
}

impl MockState {
    pub(crate) fn new(epoch: u64, view_number: u64, validator_len: usize) -> MockState {
        let genesis = artifacts::chain(1).pop().unwrap();
        MockState {
            inner: Arc::new(Mutex::new(StateInner {
                epoch: Epoch::new(epoch),
                view_number: ViewNumber::new(view_number),
                highest_qc_block: genesis.clone(),
                highest_lock_block: genesis.clone(),
                highest_commit_block: genesis,
                view_blocks: HashMap::new(),
                view_qcs: HashMap::new(),
                prepare_blocks: HashMap::new(),
                prepare_votes: HashMap::new(),
                view_changes: HashMap::new(),
                last_view_change_qc: None,
                next_view_block_index: BlockIndex::new(0),
                deadline_expired: false,
                validator_len,
                certified_chain: Vec::new(),
                chain_blocks: Vec::new(),
                inserted_block_lists: Vec::new(),
                inserted_prepare_qcs: Vec::new(),
                accepted_votes: Vec::new(),
                accepted_view_changes: Vec::new(),
                advanced_views: Vec::new(),
                reject_votes_from: HashSet::new(),
                reject_view_changes_from: HashSet::new(),
            })),
        }
    }
}

impl StateView for MockState {
    fn epoch(&self) -> Epoch {
        self.inner.lock().unwrap().epoch
    }

    fn view_number(&self) -> ViewNumber {
        self.inner.lock().unwrap().view_number
    }

    fn highest_qc_block(&self) -> Block {
        self.inner.lock().unwrap().highest_qc_block.clone()
    }

    fn highest_lock_block(&self) -> Block {
        self.inner.lock().unwrap().highest_lock_block.clone()
    }

    fn highest_commit_block(&self) -> Block {
        self.inner.lock().unwrap().highest_commit_block.clone()
    }

    fn view_block_and_qc(
        &self,
        block_index: BlockIndex,
    ) -> (Option<Block>, Option<QuorumCertificate>) {
        let inner = self.inner.lock().unwrap();
        (
            inner.view_blocks.get(&block_index).cloned(),
            inner.view_qcs.get(&block_index).cloned(),
        )
    }

    fn view_block_by_index(&self, block_index: BlockIndex) -> Option<Block> {
        self.inner.lock().unwrap().view_blocks.get(&block_index).cloned()
    }

    fn prepare_block_by_index(&self, block_index: BlockIndex) -> Option<PrepareBlock> {
        self.inner.lock().unwrap().prepare_blocks.get(&block_index).cloned()
    }

    fn prepare_votes_by_index(
        &self,
        block_index: BlockIndex,
    ) -> HashMap<ValidatorIndex, PrepareVote> {
        self.inner
            .lock()
            .unwrap()
            .prepare_votes
            .get(&block_index)
            .cloned()
            .unwrap_or_default()
    }

    fn prepare_vote_len_by_index(&self, block_index: BlockIndex) -> usize {
        self.inner
            .lock()
            .unwrap()
            .prepare_votes
            .get(&block_index)
            .map_or(0, |votes| votes.len())
    }

    fn all_view_changes(&self) -> HashMap<ValidatorIndex, ViewChange> {
        self.inner.lock().unwrap().view_changes.clone()
    }

    fn last_view_change_qc(&self) -> Option<ViewChangeQC> {
        self.inner.lock().unwrap().last_view_change_qc.clone()
    }

    fn max_qc_index(&self) -> Option<BlockIndex> {
        self.inner.lock().unwrap().view_qcs.keys().max().copied()
    }

    fn next_view_block_index(&self) -> BlockIndex {
        self.inner.lock().unwrap().next_view_block_index
    }

    fn is_deadline_expired(&self) -> bool {
        self.inner.lock().unwrap().deadline_expired
    }

    fn validator_len(&self) -> usize {
        self.inner.lock().unwrap().validator_len
    }

    fn quorum_threshold(&self, n: usize) -> usize {
        n * 2 / 3 + 1
    }
}

impl ChainView for MockState {
    fn find_block_and_qc(
        &self,
        block_hash: &CryptoHash,
        block_number: BlockNumber,
    ) -> Option<(Block, QuorumCertificate)> {
        self.inner
            .lock()
            .unwrap()
            .certified_chain
            .iter()
            .find(|(block, _)| block.hash == *block_hash && block.number == block_number)
            .cloned()
    }

    fn block_by_hash_and_number(
        &self,
        block_hash: &CryptoHash,
        _block_number: BlockNumber,
    ) -> Option<Block> {
        // Looked up by hash alone, so callers can observe a hash/number mismatch.
        self.inner
            .lock()
            .unwrap()
            .chain_blocks
            .iter()
            .find(|block| block.hash == *block_hash)
            .cloned()
    }
}

impl StateWriter for MockState {
    fn insert_block_list(
        &mut self,
        blocks: Vec<Block>,
        qcs: Vec<QuorumCertificate>,
    ) -> Result<(), SyncError> {
        self.inner.lock().unwrap().inserted_block_lists.push((blocks, qcs));
        Ok(())
    }

    fn insert_prepare_qc(&mut self, qc: QuorumCertificate) {
        let mut inner = self.inner.lock().unwrap();
        inner.view_qcs.insert(qc.block_index, qc.clone());
        inner.inserted_prepare_qcs.push(qc);
    }

    fn accept_prepare_vote(
        &mut self,
        origin: VerifyingKey,
        vote: PrepareVote,
    ) -> Result<(), SyncError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_votes_from.contains(&vote.validator_index) {
            return Err(SyncError::AuthFailed(VerifyError(
                "invalid vote signature".to_string(),
            )));
        }
        inner
            .prepare_votes
            .entry(vote.block_index)
            .or_default()
            .insert(vote.validator_index, vote.clone());
        inner.accepted_votes.push((origin, vote));
        Ok(())
    }

    fn accept_view_change(
        &mut self,
        origin: VerifyingKey,
        view_change: ViewChange,
    ) -> Result<(), SyncError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_view_changes_from.contains(&view_change.validator_index) {
            return Err(SyncError::AuthFailed(VerifyError(
                "invalid view change signature".to_string(),
            )));
        }
        inner
            .view_changes
            .insert(view_change.validator_index, view_change.clone());
        inner.accepted_view_changes.push((origin, view_change));
        Ok(())
    }

    fn advance_view_by_qc(&mut self, qc: ViewChangeQC) {
        self.inner.lock().unwrap().advanced_views.push(qc);
    }
}
