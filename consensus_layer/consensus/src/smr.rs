use chained_hotstuff_common_types::{Epoch, Height, Level};
use chained_hotstuff_storage::{BlockId, ChainStore, QuorumCert, TimeoutCert};

use crate::{error::SafetyViolation, pacemaker::Pacemaker, safety_rules::SafetyRules};

/// Composes [`Pacemaker`] (liveness) and [`SafetyRules`] (safety) over a shared [`ChainStore`],
/// exposing the combined state the driver steps on each dispatch. Holds no state of its own
/// beyond its three owned components, mirroring the teacher's thin-delegate `chainedbftSMR`.
pub struct Smr {
    pacemaker: Pacemaker,
    safety: SafetyRules,
    chain_store: ChainStore,
}

impl Smr {
    pub fn new(pacemaker: Pacemaker, safety: SafetyRules, chain_store: ChainStore) -> Self {
        Self {
            pacemaker,
            safety,
            chain_store,
        }
    }

    pub fn height(&self) -> Height {
        self.pacemaker.height()
    }

    pub fn current_level(&self) -> Level {
        self.pacemaker.current_level()
    }

    pub fn epoch_id(&self) -> Epoch {
        self.pacemaker.epoch_id()
    }

    /// Re-seeds the height to propose at next, used once at startup after hydrating the chain
    /// store from the external block store (spec §4.1 "hydrates the current QC and the block
    /// certified by it from the external block store").
    pub fn set_height(&mut self, height: Height) {
        self.pacemaker.set_height(height);
    }

    pub fn set_epoch(&mut self, epoch_id: Epoch) {
        self.pacemaker.set_epoch(epoch_id);
    }

    pub fn highest_qc(&self) -> &QuorumCert {
        self.pacemaker.highest_qc()
    }

    pub fn highest_tc(&self) -> Option<&TimeoutCert> {
        self.pacemaker.highest_tc()
    }

    pub fn locked_qc(&self) -> &QuorumCert {
        self.safety.locked_qc()
    }

    pub fn last_committed_level(&self) -> Level {
        self.safety.last_committed_level()
    }

    pub fn chain_store(&self) -> &ChainStore {
        &self.chain_store
    }

    pub fn chain_store_mut(&mut self) -> &mut ChainStore {
        &mut self.chain_store
    }

    pub fn safe_node(&self, block: &chained_hotstuff_storage::Block, justify_qc: &QuorumCert) -> bool {
        self.safety.safe_node(block, justify_qc, &self.chain_store)
    }

    pub fn check_and_record_vote(&mut self, candidate: &chained_hotstuff_storage::VoteData) -> Result<(), SafetyViolation> {
        self.safety.check_and_record_vote(candidate)
    }

    pub fn update_locked_qc(&mut self, qc: &QuorumCert) -> bool {
        self.safety.update_locked_qc(qc, &self.chain_store)
    }

    pub fn commit_rules(&mut self, qc: &QuorumCert) -> Option<(BlockId, Level)> {
        self.safety.commit_rules(qc, &self.chain_store)
    }

    /// Runs the full certificate-processing step: adopt the new QC/TC into the pacemaker, update
    /// the safety lock, then evaluate the commit rule on the resulting highest QC. Returns the
    /// commit outcome, if any, alongside whether the pacemaker's level advanced.
    pub fn process_certificates(&mut self, qc: &QuorumCert, tc: Option<&TimeoutCert>) -> (bool, Option<(BlockId, Level)>) {
        let advanced = self.pacemaker.process_certificates(qc, tc);
        self.update_locked_qc(qc);
        let committed = self.commit_rules(qc);
        (advanced, committed)
    }

    pub fn process_local_timeout(&self, level: Level) -> bool {
        self.pacemaker.process_local_timeout(level)
    }
}
