/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! "Inert" types shared by every subprotocol of the crate. These types follow the newtype
//! pattern and the API for using them is defined in this module.
//!
//! Types specific to blocks and certificates can be found in the sibling modules
//! [`crate::types::block`] and [`crate::types::certificates`].

use borsh::{BorshDeserialize, BorshSerialize};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, Sub},
};

/// A coarse-grained era of consensus, containing many views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize)]
pub struct Epoch(u64);

impl Epoch {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl Add<u64> for Epoch {
    type Output = Epoch;

    fn add(self, rhs: u64) -> Self::Output {
        Epoch(self.0.add(rhs))
    }
}

/// A round within an epoch during which one leader proposes blocks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct ViewNumber(u64);

impl ViewNumber {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn init() -> Self {
        Self(0)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for ViewNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl Add<u64> for ViewNumber {
    type Output = ViewNumber;

    fn add(self, rhs: u64) -> Self::Output {
        ViewNumber(self.0.add(rhs))
    }
}

/// Height of an existing block in the chain.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for BlockNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl Add<u64> for BlockNumber {
    type Output = BlockNumber;

    fn add(self, rhs: u64) -> Self::Output {
        BlockNumber(self.0.add(rhs))
    }
}

impl Sub<BlockNumber> for BlockNumber {
    type Output = u64;

    fn sub(self, rhs: BlockNumber) -> Self::Output {
        self.0 - rhs.0
    }
}

/// A block's position within the proposal sequence of the view that produced it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct BlockIndex(u32);

impl BlockIndex {
    pub const fn new(int: u32) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u32 {
        self.0
    }
}

impl Display for BlockIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl Add<u32> for BlockIndex {
    type Output = BlockIndex;

    fn add(self, rhs: u32) -> Self::Output {
        BlockIndex(self.0.add(rhs))
    }
}

/// Position of a validator inside the current validator set.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct ValidatorIndex(u32);

impl ValidatorIndex {
    pub const fn new(int: u32) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u32 {
        self.0
    }
}

impl Display for ValidatorIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// The hash of a block or of a wire message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }

    pub const fn zero() -> Self {
        Self([0u8; 32])
    }
}

impl Display for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Data stored in a [block][crate::types::block::Block].
#[derive(Clone, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct Data(Vec<Datum>);

impl Data {
    pub fn new(datum_vec: Vec<Datum>) -> Self {
        Self(datum_vec)
    }

    pub const fn vec(&self) -> &Vec<Datum> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Datum> {
        self.0.iter()
    }
}

/// Single datum stored in a block's [`Data`].
#[derive(Clone, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct Datum(Vec<u8>);

impl Datum {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> &Vec<u8> {
        &self.0
    }
}

/// Signature represented in bytes.
#[derive(Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct SignatureBytes([u8; 64]);

impl SignatureBytes {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 64] {
        self.0
    }
}

/// Set of signatures, represented as a vector with the size of a given validator set.
/// The value at a particular position is either:
/// 1. None: if a valid signature from the validator at the given position has not been obtained, or
/// 2. Some(signature_bytes): if signature_bytes has been obtained from the validator at the given position.
#[derive(Clone, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct SignatureSet(Vec<Option<SignatureBytes>>);

impl SignatureSet {
    pub const fn init() -> Self {
        Self(Vec::new())
    }

    pub fn new(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub const fn vec(&self) -> &Vec<Option<SignatureBytes>> {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Option<SignatureBytes>> {
        self.0.iter()
    }

    pub fn get(&self, pos: usize) -> &Option<SignatureBytes> {
        &self.0[pos]
    }

    pub fn set(&mut self, pos: usize, value: Option<SignatureBytes>) {
        let signature_vec: &mut Vec<Option<SignatureBytes>> = self.0.as_mut();
        signature_vec[pos] = value
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fixed-length bit set indexed by [validator index](ValidatorIndex), used to communicate
/// known/needed sets between peers. Whether a set bit means "known" or "needed" depends on the
/// message carrying the array, but its length always equals the validator set size. Reads and
/// writes outside the declared size are inert.
#[derive(Clone, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct BitArray {
    size: u32,
    bits: Vec<u8>,
}

impl BitArray {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            bits: vec![0; ((size + 7) / 8) as usize],
        }
    }

    pub const fn size(&self) -> u32 {
        self.size
    }

    pub fn get_index(&self, index: u32) -> bool {
        if index >= self.size {
            return false;
        }
        self.bits[(index / 8) as usize] & (1 << (index % 8)) != 0
    }

    pub fn set_index(&mut self, index: u32, value: bool) {
        if index >= self.size {
            return;
        }
        if value {
            self.bits[(index / 8) as usize] |= 1 << (index % 8);
        } else {
            self.bits[(index / 8) as usize] &= !(1 << (index % 8));
        }
    }
}

impl Debug for BitArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut bits = String::with_capacity(self.size as usize);
        for index in 0..self.size {
            bits.push(if self.get_index(index) { '1' } else { '0' });
        }
        write!(f, "BitArray({})", bits)
    }
}
