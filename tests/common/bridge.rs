use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use viewsync::bridge::{Bridge, ExecuteError, VerifyError};
use viewsync::types::{
    basic::{BlockNumber, CryptoHash, Epoch, ViewNumber},
    block::Block,
    certificates::{QuorumCertificate, ViewChangeQC},
};

/// A bridge with scriptable verification verdicts and an in-memory write-ahead log.
pub(crate) struct MockBridge {
    inner: Mutex<BridgeInner>,
}

struct BridgeInner {
    fail_qc_for: HashSet<CryptoHash>,
    fail_execute_for: HashSet<CryptoHash>,
    fail_view_change_qc: bool,
    wal: HashMap<(u64, u64), ViewChangeQC>,
    executed: Vec<(CryptoHash, CryptoHash)>,
}

impl MockBridge {
    pub(crate) fn new() -> MockBridge {
        MockBridge {
            inner: Mutex::new(BridgeInner {
                fail_qc_for: HashSet::new(),
                fail_execute_for: HashSet::new(),
                fail_view_change_qc: false,
                wal: HashMap::new(),
                executed: Vec::new(),
            }),
        }
    }

    /// Make `verify_prepare_qc` fail for the block with the given hash.
    pub(crate) fn fail_qc_for(&self, block_hash: CryptoHash) {
        self.inner.lock().unwrap().fail_qc_for.insert(block_hash);
    }

    #[allow(dead_code)]
    pub(crate) fn fail_execute_for(&self, block_hash: CryptoHash) {
        self.inner.lock().unwrap().fail_execute_for.insert(block_hash);
    }

    pub(crate) fn fail_view_change_qc(&self) {
        self.inner.lock().unwrap().fail_view_change_qc = true;
    }

    pub(crate) fn put_wal(&self, epoch: u64, view_number: u64, qc: ViewChangeQC) {
        self.inner.lock().unwrap().wal.insert((epoch, view_number), qc);
    }

    /// The `(block hash, parent hash)` pairs executed so far, in order.
    pub(crate) fn executed(&self) -> Vec<(CryptoHash, CryptoHash)> {
        self.inner.lock().unwrap().executed.clone()
    }
}

impl Bridge for MockBridge {
    fn verify_prepare_qc(
        &self,
        _block_number: BlockNumber,
        block_hash: CryptoHash,
        _qc: &QuorumCertificate,
    ) -> Result<(), VerifyError> {
        if self.inner.lock().unwrap().fail_qc_for.contains(&block_hash) {
            return Err(VerifyError("invalid quorum certificate".to_string()));
        }
        Ok(())
    }

    fn verify_view_change_qc(&self, _qc: &ViewChangeQC) -> Result<(), VerifyError> {
        if self.inner.lock().unwrap().fail_view_change_qc {
            return Err(VerifyError("invalid view change quorum certificate".to_string()));
        }
        Ok(())
    }

    fn execute_block(&self, block: &Block, parent: &Block) -> Result<(), ExecuteError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_execute_for.contains(&block.hash) {
            return Err(ExecuteError("execution failed".to_string()));
        }
        inner.executed.push((block.hash, parent.hash));
        Ok(())
    }

    fn view_change_qc(&self, epoch: Epoch, view_number: ViewNumber) -> Option<ViewChangeQC> {
        self.inner
            .lock()
            .unwrap()
            .wal
            .get(&(epoch.int(), view_number.int()))
            .cloned()
    }
}
