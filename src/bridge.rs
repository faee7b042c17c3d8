/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Thin call-through to the collaborators that this crate treats as opaque: cryptographic
//! verification of certificates, block execution, and write-ahead-log retrieval of historical
//! view-change certificates.

use std::fmt::{self, Display, Formatter};

use crate::types::{
    basic::{BlockNumber, CryptoHash, Epoch, ViewNumber},
    block::Block,
    certificates::{QuorumCertificate, ViewChangeQC},
};

/// Verification, execution and WAL hookup consumed by the
/// [Synchronizer](crate::sync::process::Synchronizer).
pub trait Bridge: Send + Sync + 'static {
    /// Verify a quorum certificate against the `(block_number, block_hash)` it claims to
    /// certify.
    fn verify_prepare_qc(
        &self,
        block_number: BlockNumber,
        block_hash: CryptoHash,
        qc: &QuorumCertificate,
    ) -> Result<(), VerifyError>;

    /// Verify an aggregated view-change certificate.
    fn verify_view_change_qc(&self, qc: &ViewChangeQC) -> Result<(), VerifyError>;

    /// Execute a block on top of its parent, staging the result in the block cache.
    fn execute_block(&self, block: &Block, parent: &Block) -> Result<(), ExecuteError>;

    /// Retrieve the historical view-change certificate for `(epoch, view_number)` from the
    /// write-ahead log. Certificates beyond the retention window may be gone.
    fn view_change_qc(&self, epoch: Epoch, view_number: ViewNumber) -> Option<ViewChangeQC>;
}

/// A certificate failed cryptographic verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError(pub String);

impl Display for VerifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for VerifyError {}

/// A block could not be executed on top of its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteError(pub String);

impl Display for ExecuteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ExecuteError {}
