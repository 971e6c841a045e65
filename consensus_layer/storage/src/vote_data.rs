use chained_hotstuff_common_types::{Epoch, Height, Level, NodeId, ValidatorIndex};
use serde::{Deserialize, Serialize};

use crate::BlockId;

/// A single validator's signed vote for a block, or for a new-view at a level where no block
/// could be agreed on. One `VoteData` is the unit [`crate::QuorumCert`] aggregation works over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteData {
    pub author: NodeId,
    pub author_idx: ValidatorIndex,
    pub height: Height,
    pub level: Level,
    pub epoch_id: Epoch,
    /// Empty iff `new_view` is true.
    pub block_id: Option<BlockId>,
    pub new_view: bool,
    /// Signature over the canonical serialization of this struct with `signature` cleared.
    /// Opaque here; verification is delegated to the injected `AccessControl` capability.
    pub signature: Vec<u8>,
}

impl VoteData {
    /// Bytes the signature is computed over: every field except `signature` itself.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(self.author.as_bytes());
        buf.extend_from_slice(&self.author_idx.as_u64().to_le_bytes());
        buf.extend_from_slice(&self.height.as_u64().to_le_bytes());
        buf.extend_from_slice(&self.level.as_u64().to_le_bytes());
        buf.extend_from_slice(&self.epoch_id.as_u64().to_le_bytes());
        match &self.block_id {
            Some(id) => buf.extend_from_slice(id.as_bytes()),
            None => buf.extend_from_slice(&[0u8; 32]),
        }
        buf.push(self.new_view as u8);
        buf
    }

    pub fn is_for_block(&self, block_id: &BlockId) -> bool {
        !self.new_view && self.block_id.as_ref() == Some(block_id)
    }
}
