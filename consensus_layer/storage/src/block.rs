use chained_hotstuff_common_types::{Epoch, Height, Level, NodeId, ValidatorIndex};
use serde::{Deserialize, Serialize};

use crate::{BlockId, QuorumCert};

/// The consensus-relevant fields of a block. Everything else (transaction payload, state root)
/// is opaque to this crate and lives in the external block/state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub height: Height,
    pub block_hash: BlockId,
    pub prev_block_hash: BlockId,
    pub proposer: NodeId,
    pub consensus_args: ConsensusArgs,
    /// The QC this block extends, i.e. the certificate for `prev_block_hash`.
    pub justify_qc: QuorumCert,
    /// The QC that certifies *this* block, once one has formed. `None` until quorum votes land.
    pub qc: Option<QuorumCert>,
}

/// `extraData.consensusArgs` in the wire format: the fields the engine itself attaches to a
/// proposal, opaque to block execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusArgs {
    pub level: Level,
    pub proposer_index: ValidatorIndex,
    pub epoch_id: Epoch,
}

impl Block {
    pub fn parent(&self) -> &BlockId {
        &self.prev_block_hash
    }

    /// I6: a block's `justify_qc.block_id` must equal its declared parent.
    pub fn justify_matches_parent(&self) -> bool {
        self.justify_qc.justifies_block() == Some(&self.prev_block_hash)
    }
}
