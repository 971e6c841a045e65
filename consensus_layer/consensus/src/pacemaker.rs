use chained_hotstuff_common_types::{Epoch, Height, Level};
use chained_hotstuff_storage::{QuorumCert, TimeoutCert};
use log::*;

const LOG_TARGET: &str = "chained_hotstuff::pacemaker";

/// Tracks `(height, currentLevel, epochId, highestQC, highestTC)` and advances `currentLevel` on
/// QC/TC receipt (C7). This is the liveness half of the protocol; `SafetyRules` is the safety
/// half, and `Smr` composes the two.
pub struct Pacemaker {
    height: Height,
    current_level: Level,
    epoch_id: Epoch,
    highest_qc: QuorumCert,
    highest_tc: Option<TimeoutCert>,
}

impl Pacemaker {
    pub fn new(height: Height, current_level: Level, epoch_id: Epoch, highest_qc: QuorumCert) -> Self {
        Self {
            height,
            current_level,
            epoch_id,
            highest_qc,
            highest_tc: None,
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn current_level(&self) -> Level {
        self.current_level
    }

    pub fn epoch_id(&self) -> Epoch {
        self.epoch_id
    }

    pub fn highest_qc(&self) -> &QuorumCert {
        &self.highest_qc
    }

    pub fn highest_tc(&self) -> Option<&TimeoutCert> {
        self.highest_tc.as_ref()
    }

    pub fn set_epoch(&mut self, epoch_id: Epoch) {
        self.epoch_id = epoch_id;
    }

    pub fn set_height(&mut self, height: Height) {
        self.height = height;
    }

    /// I7: `currentLevel` is strictly greater than every QC or TC level ever processed, because
    /// it only ever advances to `max(highestQC, highestTC).level + 1`, never lower.
    ///
    /// 1. Adopt `qc` as `highestQC` if it's newer.
    /// 2. Adopt `tc` as `highestTC` if given and newer.
    /// 3. Advance `currentLevel` to `max(highestQC, highestTC).level + 1` if that's higher than
    ///    the level we're already at.
    ///
    /// Returns `true` iff `currentLevel` advanced (P6).
    pub fn process_certificates(&mut self, qc: &QuorumCert, tc: Option<&TimeoutCert>) -> bool {
        if qc.level > self.highest_qc.level {
            self.highest_qc = qc.clone();
            // A QC that actually certifies a block (not a new-view/timeout QC) moves the chain
            // tip forward, so the next block to propose sits one height above it. A TC-only
            // advance leaves `height` untouched: the level moves on without a new block.
            if !qc.new_view {
                self.height = qc.height.saturating_add(Height(1));
            }
        }
        if let Some(tc) = tc {
            if self.highest_tc.as_ref().map(|t| t.level()).unwrap_or(Level::zero()) < tc.level() {
                self.highest_tc = Some(tc.clone());
            }
        }

        let highest_tc_level = self.highest_tc.as_ref().map(|t| t.level()).unwrap_or(Level::zero());
        let new_level = self.highest_qc.level.max(highest_tc_level).next();

        if new_level > self.current_level {
            debug!(target: LOG_TARGET, "advancing level {} -> {new_level}", self.current_level);
            self.current_level = new_level;
            true
        } else {
            false
        }
    }

    /// A local round timeout fired for `level`. If the pacemaker has already moved past that
    /// level (a certificate arrived in the meantime), the timeout is stale and ignored; otherwise
    /// the caller should emit a new-view vote referencing `highestQC`.
    pub fn process_local_timeout(&self, level: Level) -> bool {
        if level != self.current_level {
            debug!(target: LOG_TARGET, "ignoring stale local timeout for level {level}, current is {}", self.current_level);
            return false;
        }
        warn!(target: LOG_TARGET, "local timeout at level {level}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qc_at(level: u64) -> QuorumCert {
        QuorumCert {
            block_id: Some(chained_hotstuff_storage::BlockId::from_bytes([level as u8; 32])),
            height: Height(level),
            level: Level(level),
            epoch_id: Epoch(0),
            new_view: false,
            votes: Vec::new(),
        }
    }

    fn tc_at(level: u64) -> TimeoutCert {
        TimeoutCert::from_new_view_qc(QuorumCert {
            block_id: None,
            height: Height(level),
            level: Level(level),
            epoch_id: Epoch(0),
            new_view: true,
            votes: Vec::new(),
        })
    }

    #[test]
    fn process_certificates_advances_height_with_a_real_block_qc() {
        let mut pacemaker = Pacemaker::new(Height(0), Level(0), Epoch(0), qc_at(0));
        pacemaker.process_certificates(&qc_at(3), None);
        assert_eq!(pacemaker.height(), Height(4));
    }

    #[test]
    fn a_timeout_only_advance_leaves_height_unchanged() {
        let mut pacemaker = Pacemaker::new(Height(5), Level(2), Epoch(0), qc_at(2));
        pacemaker.process_certificates(&qc_at(2), Some(&tc_at(4)));
        assert_eq!(pacemaker.height(), Height(5));
        assert_eq!(pacemaker.current_level(), Level(5));
    }

    #[test]
    fn process_certificates_advances_past_highest_qc() {
        let mut pacemaker = Pacemaker::new(Height(0), Level(0), Epoch(0), qc_at(0));
        assert!(pacemaker.process_certificates(&qc_at(3), None));
        assert_eq!(pacemaker.current_level(), Level(4));
    }

    #[test]
    fn process_certificates_is_a_no_op_below_current_level() {
        let mut pacemaker = Pacemaker::new(Height(0), Level(0), Epoch(0), qc_at(0));
        assert!(pacemaker.process_certificates(&qc_at(5), None));
        assert!(!pacemaker.process_certificates(&qc_at(2), None));
        assert_eq!(pacemaker.current_level(), Level(6));
    }

    #[test]
    fn tc_can_advance_level_past_the_qc_alone() {
        let mut pacemaker = Pacemaker::new(Height(0), Level(0), Epoch(0), qc_at(2));
        assert!(pacemaker.process_certificates(&qc_at(2), Some(&tc_at(4))));
        assert_eq!(pacemaker.current_level(), Level(5));
    }

    #[test]
    fn stale_local_timeout_is_ignored() {
        let mut pacemaker = Pacemaker::new(Height(0), Level(0), Epoch(0), qc_at(0));
        pacemaker.process_certificates(&qc_at(5), None);
        assert!(!pacemaker.process_local_timeout(Level(3)));
        assert!(pacemaker.process_local_timeout(Level(6)));
    }
}
