use std::collections::BTreeMap;

use async_trait::async_trait;
use chained_hotstuff_common_types::{Committee, Epoch, Height, NodeId, ValidatorIndex};
use log::info;
use parking_lot::RwLock;

use crate::{EpochManagerError, EpochManagerReader};

const LOG_TARGET: &str = "chained_hotstuff::epoch_manager";

/// How many committed blocks past a predecessor epoch's switch height still verify against that
/// predecessor's validator set (spec §4.4, §9 "within 3 blocks *after* switch use previous set").
const GRACE_WINDOW_BLOCKS: u64 = 3;

#[derive(Debug, Clone)]
struct PreviousEpoch {
    committee: Committee,
    next_switch_height: Height,
}

#[derive(Debug, Clone)]
struct GovernanceSnapshot {
    epoch_id: Epoch,
    committee: Committee,
    next_switch_height: Height,
    self_index: Option<ValidatorIndex>,
    previous: Option<PreviousEpoch>,
}

/// Snapshots governance state at each epoch switch (C4). Keyed by the height at which the
/// snapshot became active; lookups take the most recent snapshot at or before the queried height.
pub struct InMemoryEpochManager {
    snapshots: RwLock<BTreeMap<Height, GovernanceSnapshot>>,
}

impl InMemoryEpochManager {
    /// Seeds the manager with the genesis epoch, active from height zero.
    pub fn genesis(epoch_id: Epoch, committee: Committee, next_switch_height: Height, self_index: Option<ValidatorIndex>) -> Self {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(
            Height::zero(),
            GovernanceSnapshot {
                epoch_id,
                committee,
                next_switch_height,
                self_index,
                previous: None,
            },
        );
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }

    /// Installs a new epoch, active from `active_from_height` (the height of the committed block
    /// that crossed the predecessor's `next_switch_height`). The predecessor's committee and
    /// switch height are retained for the grace window.
    pub fn install_epoch(
        &self,
        active_from_height: Height,
        epoch_id: Epoch,
        committee: Committee,
        next_switch_height: Height,
        self_index: Option<ValidatorIndex>,
    ) {
        let mut snapshots = self.snapshots.write();
        let previous = snapshots.values().next_back().map(|snap| PreviousEpoch {
            committee: snap.committee.clone(),
            next_switch_height: snap.next_switch_height,
        });
        info!(target: LOG_TARGET, "installing epoch {epoch_id} active from height {active_from_height}");
        snapshots.insert(
            active_from_height,
            GovernanceSnapshot {
                epoch_id,
                committee,
                next_switch_height,
                self_index,
                previous,
            },
        );
    }

    fn snapshot_for(&self, block_height: Height) -> Result<GovernanceSnapshot, EpochManagerError> {
        self.snapshots
            .read()
            .range(..=block_height)
            .next_back()
            .map(|(_, snap)| snap.clone())
            .ok_or(EpochManagerError::NoSnapshotAt(block_height))
    }

    fn latest_snapshot(&self) -> Result<GovernanceSnapshot, EpochManagerError> {
        self.snapshots
            .read()
            .values()
            .next_back()
            .cloned()
            .ok_or(EpochManagerError::NoSnapshotAt(Height::zero()))
    }

    /// Applies the grace-window rule: strictly after a predecessor's switch height and within
    /// `GRACE_WINDOW_BLOCKS` of it, the predecessor's committee is still authoritative.
    fn committee_for(&self, block_height: Height) -> Result<Committee, EpochManagerError> {
        let snapshot = self.snapshot_for(block_height)?;
        if let Some(previous) = &snapshot.previous {
            let grace_ceiling = previous.next_switch_height.saturating_add(Height(GRACE_WINDOW_BLOCKS));
            if block_height > previous.next_switch_height && block_height <= grace_ceiling {
                return Ok(previous.committee.clone());
            }
        }
        Ok(snapshot.committee)
    }
}

#[async_trait]
impl EpochManagerReader for InMemoryEpochManager {
    async fn get_peers(&self, block_height: Height) -> Result<Committee, EpochManagerError> {
        self.committee_for(block_height)
    }

    async fn get_peer_by_index(&self, idx: ValidatorIndex, block_height: Height) -> Result<NodeId, EpochManagerError> {
        let committee = self.committee_for(block_height)?;
        committee
            .get(idx)
            .cloned()
            .ok_or(EpochManagerError::InvalidValidatorIndex(idx.as_u64()))
    }

    async fn is_valid_idx(&self, idx: ValidatorIndex, block_height: Height) -> Result<bool, EpochManagerError> {
        let committee = self.committee_for(block_height)?;
        Ok(committee.get(idx).is_some())
    }

    async fn min_quorum_for_qc(&self, block_height: Height) -> Result<usize, EpochManagerError> {
        let committee = self.committee_for(block_height)?;
        Ok(committee.quorum_threshold())
    }

    async fn next_switch_height(&self) -> Result<Height, EpochManagerError> {
        Ok(self.latest_snapshot()?.next_switch_height)
    }

    async fn self_index(&self) -> Result<Option<ValidatorIndex>, EpochManagerError> {
        Ok(self.latest_snapshot()?.self_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committee(n: u64) -> Committee {
        Committee::new((0..n).map(|i| NodeId::new(vec![i as u8])).collect())
    }

    fn five_member_committee() -> Committee {
        committee(5)
    }

    #[tokio::test]
    async fn grace_window_applies_after_switch_not_before() {
        let old = five_member_committee();
        let manager = InMemoryEpochManager::genesis(Epoch(0), old.clone(), Height(100), Some(ValidatorIndex(0)));

        let new = committee(4);
        manager.install_epoch(Height(101), Epoch(1), new.clone(), Height(200), None);

        // Exactly at the switch height: still the old epoch's own snapshot, no grace needed.
        assert_eq!(manager.get_peers(Height(100)).await.unwrap(), old);

        // Within the window strictly after the switch height: previous committee applies.
        assert_eq!(manager.get_peers(Height(101)).await.unwrap(), old);
        assert_eq!(manager.get_peers(Height(103)).await.unwrap(), old);

        // Past the window: new committee applies.
        assert_eq!(manager.get_peers(Height(104)).await.unwrap(), new);
    }

    #[tokio::test]
    async fn min_quorum_tracks_committee_size() {
        let manager = InMemoryEpochManager::genesis(Epoch(0), committee(4), Height(50), Some(ValidatorIndex(0)));
        assert_eq!(manager.min_quorum_for_qc(Height(10)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn next_switch_height_and_self_index_reflect_latest_epoch() {
        let manager = InMemoryEpochManager::genesis(Epoch(0), committee(4), Height(50), Some(ValidatorIndex(2)));
        manager.install_epoch(Height(51), Epoch(1), committee(4), Height(150), Some(ValidatorIndex(1)));

        assert_eq!(manager.next_switch_height().await.unwrap(), Height(150));
        assert_eq!(manager.self_index().await.unwrap(), Some(ValidatorIndex(1)));
    }

    #[tokio::test]
    async fn invalid_index_is_reported() {
        let manager = InMemoryEpochManager::genesis(Epoch(0), committee(4), Height(50), Some(ValidatorIndex(0)));
        assert!(!manager.is_valid_idx(ValidatorIndex(9), Height(10)).await.unwrap());
    }
}
