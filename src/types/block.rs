/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the 'block' type and its associated methods.

use borsh::{BorshDeserialize, BorshSerialize};
pub use sha2::Sha256 as CryptoHasher;
use sha2::Digest;

use crate::types::basic::*;

/// A candidate block proposed during a view. Blocks are immutable and identified by
/// `(number, hash, parent_hash)`; this crate only ever references blocks held by the chain
/// storage and consensus state collaborators, it never authors them.
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Block {
    pub number: BlockNumber,
    pub hash: CryptoHash,
    pub parent_hash: CryptoHash,
    pub data_hash: CryptoHash,
    pub data: Data,
}

impl Block {
    pub fn new(
        number: BlockNumber,
        parent_hash: CryptoHash,
        data_hash: CryptoHash,
        data: Data,
    ) -> Block {
        Block {
            number,
            hash: Block::hash(number, &parent_hash, &data_hash),
            parent_hash,
            data_hash,
            data,
        }
    }

    pub fn hash(
        number: BlockNumber,
        parent_hash: &CryptoHash,
        data_hash: &CryptoHash,
    ) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(&number.try_to_vec().unwrap());
        hasher.update(&parent_hash.try_to_vec().unwrap());
        hasher.update(&data_hash.try_to_vec().unwrap());
        CryptoHash::new(hasher.finalize().into())
    }

    /// Checks if the block's hash is consistent with its contents.
    pub fn is_correct(&self) -> bool {
        self.hash == Block::hash(self.number, &self.parent_hash, &self.data_hash)
    }
}
