use chained_hotstuff_common_types::{Epoch, Level};
use chained_hotstuff_storage::{Block, BlockId, ChainStore, QuorumCert, VoteData};
use log::*;

use crate::error::SafetyViolation;

const LOG_TARGET: &str = "chained_hotstuff::safety_rules";

/// Enforces the vote and commit safety predicates (C6): `lockedQC`, `lastCommittedLevel` and
/// `lastVote` are the only state a Byzantine-safe node needs to carry across restarts (once
/// replayed from the WAL) to never double-vote or commit conflicting blocks.
pub struct SafetyRules {
    locked_qc: QuorumCert,
    last_committed_level: Level,
    last_vote: Option<VoteData>,
}

impl SafetyRules {
    pub fn new(genesis_qc: QuorumCert) -> Self {
        Self {
            locked_qc: genesis_qc,
            last_committed_level: Level::zero(),
            last_vote: None,
        }
    }

    pub fn locked_qc(&self) -> &QuorumCert {
        &self.locked_qc
    }

    pub fn last_committed_level(&self) -> Level {
        self.last_committed_level
    }

    pub fn last_vote(&self) -> Option<&VoteData> {
        self.last_vote.as_ref()
    }

    /// I2: refuses a second, conflicting vote at the same `(height, level, epoch)`. A replayed
    /// vote identical to the one already recorded is accepted idempotently (L2), which is what
    /// lets WAL replay re-run the same dispatch path without tripping this check.
    pub fn check_and_record_vote(&mut self, candidate: &VoteData) -> Result<(), SafetyViolation> {
        if let Some(last) = &self.last_vote {
            if last.height == candidate.height && last.level == candidate.level && last.epoch_id == candidate.epoch_id {
                if last.block_id == candidate.block_id && last.new_view == candidate.new_view {
                    return Ok(());
                }
                return Err(SafetyViolation::WouldDoubleVote {
                    height: candidate.height,
                    level: candidate.level,
                    epoch: candidate.epoch_id,
                });
            }
        }
        self.last_vote = Some(candidate.clone());
        Ok(())
    }

    /// Accept iff the proposal's justify QC is at least as recent as the lock, and the proposed
    /// block extends the locked block (liveness-safe: a TC at a higher level than the lock can
    /// still justify a proposal that forks away from it, because `justify_qc.level >=
    /// locked_qc.level` is enough — the lock itself only ever ratchets forward in
    /// `update_locked_qc`).
    pub fn safe_node(&self, block: &Block, justify_qc: &QuorumCert, chain_store: &ChainStore) -> bool {
        if justify_qc.level < self.locked_qc.level {
            return false;
        }
        self.extends_locked_block(block, chain_store)
    }

    fn extends_locked_block(&self, block: &Block, chain_store: &ChainStore) -> bool {
        let Some(locked_id) = self.locked_qc.justifies_block() else {
            return true;
        };
        block.prev_block_hash == *locked_id || chain_store.is_descendant_of(&block.prev_block_hash, locked_id)
    }

    /// `lockedQC := qc` iff `qc.level > lockedQC.level` and a block on the 2-chain from `qc`
    /// (the parent the QC's block itself justifies) is present in the chain store.
    pub fn update_locked_qc(&mut self, qc: &QuorumCert, chain_store: &ChainStore) -> bool {
        if qc.level <= self.locked_qc.level {
            return false;
        }
        let Some(block_id) = qc.justifies_block() else {
            return false;
        };
        let Some(block) = chain_store.get_block(block_id) else {
            return false;
        };
        let Some(parent_id) = block.justify_qc.justifies_block() else {
            return false;
        };
        if !chain_store.contains(parent_id) {
            return false;
        }
        debug!(target: LOG_TARGET, "lockedQC advanced to level {}", qc.level);
        self.locked_qc = qc.clone();
        true
    }

    /// Walks `qc -> qc.justify -> justify.justify` via the chain store's block links. A 3-chain
    /// of strictly increasing, parent-certifying levels commits the oldest block in the chain and
    /// ratchets `lastCommittedLevel` forward. Returns `None` for chains shorter than 3 or with
    /// non-increasing levels (L3).
    pub fn commit_rules(&mut self, qc: &QuorumCert, chain_store: &ChainStore) -> Option<(BlockId, Level)> {
        let block3_id = qc.justifies_block()?;
        let block3 = chain_store.get_block(block3_id)?;

        let qc2 = &block3.justify_qc;
        let block2_id = qc2.justifies_block()?;
        if *block2_id != block3.prev_block_hash {
            return None;
        }
        let block2 = chain_store.get_block(block2_id)?;

        let qc1 = &block2.justify_qc;
        let block1_id = qc1.justifies_block()?;
        if *block1_id != block2.prev_block_hash {
            return None;
        }

        if !(qc1.level < qc2.level && qc2.level < qc.level) {
            return None;
        }

        if qc1.level <= self.last_committed_level {
            return None;
        }

        self.last_committed_level = qc1.level;
        info!(target: LOG_TARGET, "committing block {block1_id} at level {}", qc1.level);
        Some((*block1_id, qc1.level))
    }
}
