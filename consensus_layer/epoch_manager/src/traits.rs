use async_trait::async_trait;
use chained_hotstuff_common_types::{Committee, Height, NodeId, ValidatorIndex};

use crate::EpochManagerError;

/// Read-only view over the validator-set/quorum/switch-height governance contract (C4). The
/// engine only ever reads through this trait; who writes the underlying contract state (and how
/// it gets there) is out of scope.
#[async_trait]
pub trait EpochManagerReader: Send + Sync {
    /// The committee effective for a block at `block_height`, honoring the grace window.
    async fn get_peers(&self, block_height: Height) -> Result<Committee, EpochManagerError>;

    async fn get_peer_by_index(
        &self,
        idx: ValidatorIndex,
        block_height: Height,
    ) -> Result<NodeId, EpochManagerError>;

    async fn is_valid_idx(&self, idx: ValidatorIndex, block_height: Height) -> Result<bool, EpochManagerError>;

    /// `⌈2n/3⌉+1` for the committee effective at `block_height`.
    async fn min_quorum_for_qc(&self, block_height: Height) -> Result<usize, EpochManagerError>;

    /// The height at which the currently installed epoch hands off to its successor.
    async fn next_switch_height(&self) -> Result<Height, EpochManagerError>;

    /// This node's slot in the currently installed epoch, or `None` if it isn't a validator.
    async fn self_index(&self) -> Result<Option<ValidatorIndex>, EpochManagerError>;
}
