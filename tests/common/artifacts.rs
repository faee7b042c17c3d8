//! Constructors for the blocks, votes and certificates the tests exchange. The cryptographic
//! material in them is placeholder bytes: verification verdicts come from the scriptable
//! [mock bridge](super::bridge::MockBridge), not from real signatures.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::OsRng;

use viewsync::messages::PrepareBlock;
use viewsync::types::{
    basic::{
        BitArray, BlockIndex, BlockNumber, CryptoHash, Data, Epoch, SignatureBytes, SignatureSet,
        ValidatorIndex, ViewNumber,
    },
    block::Block,
    certificates::{PrepareVote, QuorumCertificate, ViewChange, ViewChangeCert, ViewChangeQC},
};

pub(crate) fn random_peer() -> VerifyingKey {
    SigningKey::generate(&mut OsRng).verifying_key()
}

/// A chain of `len` blocks, numbered from 0, each extending the previous one.
pub(crate) fn chain(len: usize) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(len);
    let mut parent_hash = CryptoHash::zero();
    for number in 0..len as u64 {
        let block = Block::new(
            BlockNumber::new(number),
            parent_hash,
            CryptoHash::new([number as u8; 32]),
            Data::new(Vec::new()),
        );
        parent_hash = block.hash;
        blocks.push(block);
    }
    blocks
}

pub(crate) fn qc_for(
    block: &Block,
    epoch: u64,
    view_number: u64,
    block_index: u32,
) -> QuorumCertificate {
    QuorumCertificate {
        epoch: Epoch::new(epoch),
        view_number: ViewNumber::new(view_number),
        block_hash: block.hash,
        block_number: block.number,
        block_index: BlockIndex::new(block_index),
        signatures: SignatureSet::init(),
    }
}

pub(crate) fn prepare_block(
    epoch: u64,
    view_number: u64,
    block_index: u32,
    block: Block,
) -> PrepareBlock {
    PrepareBlock {
        epoch: Epoch::new(epoch),
        view_number: ViewNumber::new(view_number),
        block_index: BlockIndex::new(block_index),
        block,
    }
}

pub(crate) fn prepare_vote(
    epoch: u64,
    view_number: u64,
    block: &Block,
    block_index: u32,
    validator_index: u32,
) -> PrepareVote {
    PrepareVote {
        epoch: Epoch::new(epoch),
        view_number: ViewNumber::new(view_number),
        block_hash: block.hash,
        block_number: block.number,
        block_index: BlockIndex::new(block_index),
        validator_index: ValidatorIndex::new(validator_index),
        signature: SignatureBytes::new([0u8; 64]),
    }
}

pub(crate) fn view_change(
    epoch: u64,
    view_number: u64,
    block: &Block,
    validator_index: u32,
) -> ViewChange {
    ViewChange {
        epoch: Epoch::new(epoch),
        view_number: ViewNumber::new(view_number),
        block_hash: block.hash,
        block_number: block.number,
        validator_index: ValidatorIndex::new(validator_index),
        signature: SignatureBytes::new([0u8; 64]),
    }
}

pub(crate) fn view_change_qc(
    epoch: u64,
    view_number: u64,
    block: &Block,
    validator_len: u32,
) -> ViewChangeQC {
    ViewChangeQC {
        certs: vec![ViewChangeCert {
            epoch: Epoch::new(epoch),
            view_number: ViewNumber::new(view_number),
            block_hash: block.hash,
            block_number: block.number,
            validator_set: BitArray::new(validator_len),
            signature: SignatureBytes::new([0u8; 64]),
        }],
    }
}
