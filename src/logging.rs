/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out protocol events.
//!
//! The crate logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! Peer keys and hashes are shortened to the first seven characters of their Base64 encoding.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

// Get a more readable representation of a bytesequence by base64-encoding it and taking the
// first 7 characters.
pub(crate) fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

pub(crate) mod trace {
    use ed25519_dalek::VerifyingKey;

    use super::first_seven_base64_chars;
    use crate::types::basic::BlockNumber;

    pub(crate) fn had_fetching_block() {
        log::trace!("Had fetching block")
    }

    pub(crate) fn no_suitable_block(block_number: BlockNumber) {
        log::trace!("No suitable block need to request, number: {}", block_number)
    }

    pub(crate) fn on_pong(peer: &VerifyingKey, millis: u64) {
        log::trace!(
            "OnPong, peer: {}, latency: {}ms",
            first_seven_base64_chars(&peer.to_bytes()),
            millis
        )
    }

    pub(crate) fn unmatched_response(kind: &str) {
        log::trace!("Dropped {} with no matching fetch task", kind)
    }

    pub(crate) fn status_equal(remote: BlockNumber, local: BlockNumber) {
        log::trace!(
            "Local highest-QC number equals the sender's, remote: {}, local: {}",
            remote,
            local
        )
    }
}

pub(crate) mod debug {
    use ed25519_dalek::VerifyingKey;

    use super::first_seven_base64_chars;
    use crate::types::basic::{BlockIndex, BlockNumber, CryptoHash, Epoch, ViewNumber};

    pub(crate) fn received_message(kind: &str, peer: &VerifyingKey) {
        log::debug!(
            "Received {}, peer: {}",
            kind,
            first_seven_base64_chars(&peer.to_bytes())
        )
    }

    pub(crate) fn send_message(peer: &VerifyingKey, kind: &str) {
        log::debug!(
            "Send {}, peer: {}",
            kind,
            first_seven_base64_chars(&peer.to_bytes())
        )
    }

    pub(crate) fn start_fetching(
        peer: &VerifyingKey,
        base_block_hash: &CryptoHash,
        base_block_number: BlockNumber,
    ) {
        log::debug!(
            "Start fetching, peer: {}, baseBlockHash: {}, baseBlockNumber: {}",
            first_seven_base64_chars(&peer.to_bytes()),
            first_seven_base64_chars(&base_block_hash.bytes()),
            base_block_number
        )
    }

    pub(crate) fn close_fetching() {
        log::debug!("Close fetching")
    }

    pub(crate) fn fetch_timeout(peer: &VerifyingKey) {
        log::debug!(
            "Fetch timeout, close fetching, peer: {}",
            first_seven_base64_chars(&peer.to_bytes())
        )
    }

    pub(crate) fn response_length_mismatch(blocks: usize, qcs: usize) {
        log::debug!(
            "Response block and QC counts differ, blocks: {}, qcs: {}",
            blocks,
            qcs
        )
    }

    pub(crate) fn response_chain_broken(
        block_hash: &CryptoHash,
        block_number: BlockNumber,
        parent_hash: &CryptoHash,
    ) {
        log::debug!(
            "Response block does not extend the accepted chain, blockHash: {}, blockNumber: {}, expectedParent: {}",
            first_seven_base64_chars(&block_hash.bytes()),
            block_number,
            first_seven_base64_chars(&parent_hash.bytes())
        )
    }

    pub(crate) fn mismatched_view(kind: &str, epoch: Epoch, view_number: ViewNumber) {
        log::debug!(
            "Received {} that does not match the current view, epoch: {}, viewNumber: {}",
            kind,
            epoch,
            view_number
        )
    }

    pub(crate) fn status_behind(remote: BlockNumber, local: BlockNumber) {
        log::debug!(
            "Local highest-QC number is less than the sender's, remote: {}, local: {}",
            remote,
            local
        )
    }

    pub(crate) fn status_ahead(remote: BlockNumber, local: BlockNumber) {
        log::debug!(
            "Local highest-QC number is larger than the sender's, remote: {}, local: {}",
            remote,
            local
        )
    }

    pub(crate) fn peer_state_too_low(local: BlockNumber, requested: BlockNumber) {
        log::debug!(
            "Reject GetQCBlockList, local highest-QC number: {}, requested number: {}",
            local,
            requested
        )
    }

    pub(crate) fn no_need_sync(what: &str) {
        log::debug!("No need to sync {}", what)
    }

    pub(crate) fn missing_prepare_vote(
        epoch: Epoch,
        view_number: ViewNumber,
        begin: BlockIndex,
        end: BlockIndex,
        validator_len: usize,
    ) {
        log::debug!(
            "MissingPrepareVote, epoch: {}, viewNumber: {}, beginIndex: {}, endIndex: {}, validatorLen: {}",
            epoch,
            view_number,
            begin,
            end,
            validator_len
        )
    }

    pub(crate) fn avg_latency(millis: u128) {
        log::debug!("Get avg latency, avg: {}ms", millis)
    }
}

pub(crate) mod error {
    use ed25519_dalek::VerifyingKey;

    use super::first_seven_base64_chars;
    use crate::bridge::{ExecuteError, VerifyError};
    use crate::network::PeerNotConnected;
    use crate::sync::SyncError;
    use crate::types::basic::{BlockNumber, CryptoHash};

    pub(crate) fn verify_qc_failed(
        block_hash: &CryptoHash,
        block_number: BlockNumber,
        err: &VerifyError,
    ) {
        log::error!(
            "Verify block prepare QC failed, hash: {}, number: {}, error: {}",
            first_seven_base64_chars(&block_hash.bytes()),
            block_number,
            err
        )
    }

    pub(crate) fn verify_view_change_qc_failed(err: &VerifyError) {
        log::debug!("Verify ViewChangeQC failed, error: {}", err)
    }

    pub(crate) fn execute_block_failed(
        block_hash: &CryptoHash,
        block_number: BlockNumber,
        err: &ExecuteError,
    ) {
        log::error!(
            "Execute block failed, hash: {}, number: {}, error: {}",
            first_seven_base64_chars(&block_hash.bytes()),
            block_number,
            err
        )
    }

    pub(crate) fn insert_blocks_failed(err: &SyncError) {
        log::error!("Insert blocks failed, error: {}", err)
    }

    pub(crate) fn replay_failed(kind: &str, peer: &VerifyingKey, err: &SyncError) {
        log::error!(
            "{} replay failed, peer: {}, error: {}",
            kind,
            first_seven_base64_chars(&peer.to_bytes()),
            err
        )
    }

    pub(crate) fn set_peer_block_number_failed(peer: &VerifyingKey, err: &PeerNotConnected) {
        log::error!(
            "Set peer block number failed, peer: {}, error: {}",
            first_seven_base64_chars(&peer.to_bytes()),
            err
        )
    }

    pub(crate) fn last_view_change_qc_missing() {
        log::error!("Not found lastViewChangeQC")
    }

    pub(crate) fn last_view_change_qc_mismatch(err: &SyncError) {
        log::error!("Last view change QC does not match the request, error: {}", err)
    }
}
