use std::collections::HashMap;

use chained_hotstuff_common_types::Height;
use log::debug;

use crate::{Block, BlockId, QuorumCert, StorageError};

const LOG_TARGET: &str = "chained_hotstuff::chain_store";

/// Startup hydration hook into the external block/state store (out of scope here per spec §1 —
/// "persistent block store and state-DB"). `ChainStore` only needs to know the highest certified
/// block when the process starts; everything else it keeps in memory from then on.
pub trait ExternalBlockStore {
    fn highest_certified_block(&self) -> anyhow::Result<Option<(Block, QuorumCert)>>;
}

/// In-memory pool of blocks not yet pruned below the commit floor, plus the highest QC known to
/// certify a block already in the pool (C1). All mutation happens on the driver thread; this type
/// does no locking of its own.
#[derive(Debug, Default)]
pub struct ChainStore {
    blocks: HashMap<BlockId, Block>,
    parent_index: HashMap<BlockId, BlockId>,
    current_qc: Option<QuorumCert>,
    commit_floor: Height,
}

impl ChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the highest certified block from the external store and seeds this pool with it.
    /// Fatal if the external store itself is unavailable (spec §4.10): callers should propagate
    /// the error up rather than starting with an empty, possibly-inconsistent pool.
    pub fn hydrate(&mut self, external: &dyn ExternalBlockStore) -> anyhow::Result<()> {
        if let Some((block, qc)) = external.highest_certified_block()? {
            self.commit_floor = block.height;
            self.blocks.insert(block.block_hash, block);
            self.current_qc = Some(qc);
        }
        Ok(())
    }

    pub fn insert(&mut self, block: Block, justify_qc: QuorumCert) -> Result<(), StorageError> {
        if self.blocks.contains_key(&block.block_hash) {
            return Err(StorageError::DuplicateBlock(block.block_hash));
        }
        if !block.prev_block_hash.is_zero() && !self.blocks.contains_key(&block.prev_block_hash) {
            return Err(StorageError::MissingParent {
                block: block.block_hash,
                parent: block.prev_block_hash,
            });
        }

        let block_id = block.block_hash;
        let parent_id = block.prev_block_hash;

        if justify_qc.height > self.current_qc.as_ref().map(|qc| qc.height).unwrap_or(Height::zero())
            || self.current_qc.is_none()
        {
            self.current_qc = Some(justify_qc);
        }

        self.parent_index.insert(block_id, parent_id);
        self.blocks.insert(block_id, block);
        debug!(target: LOG_TARGET, "inserted block {block_id} (parent {parent_id})");
        Ok(())
    }

    /// Records a freshly formed QC as certifying a block already in the pool.
    pub fn record_qc(&mut self, qc: QuorumCert) -> Result<(), StorageError> {
        if let Some(block_id) = qc.justifies_block() {
            if !self.blocks.contains_key(block_id) {
                return Err(StorageError::BlockNotFound(*block_id));
            }
            if let Some(block) = self.blocks.get_mut(block_id) {
                block.qc = Some(qc.clone());
            }
        }
        if qc.height > self.current_qc.as_ref().map(|c| c.height).unwrap_or(Height::zero()) {
            self.current_qc = Some(qc);
        }
        Ok(())
    }

    pub fn get_block(&self, block_id: &BlockId) -> Option<&Block> {
        self.blocks.get(block_id)
    }

    pub fn get_parent_id(&self, block_id: &BlockId) -> Option<&BlockId> {
        self.parent_index.get(block_id)
    }

    pub fn contains(&self, block_id: &BlockId) -> bool {
        self.blocks.contains_key(block_id)
    }

    pub fn get_current_qc(&self) -> Option<&QuorumCert> {
        self.current_qc.as_ref()
    }

    pub fn get_current_certified_block(&self) -> Option<&Block> {
        self.current_qc
            .as_ref()
            .and_then(|qc| qc.justifies_block())
            .and_then(|id| self.blocks.get(id))
    }

    /// Walks `block_id`'s ancestry back to (and including) the chain store's root, used by
    /// `CommitRules`'s 3-chain walk and by `SafeNode`'s "extends the locked block" check.
    pub fn ancestors(&self, block_id: &BlockId) -> Vec<BlockId> {
        let mut chain = Vec::new();
        let mut current = *block_id;
        while let Some(parent) = self.parent_index.get(&current) {
            chain.push(current);
            if *parent == current {
                break;
            }
            current = *parent;
        }
        chain
    }

    pub fn is_descendant_of(&self, descendant: &BlockId, ancestor: &BlockId) -> bool {
        if descendant == ancestor {
            return true;
        }
        let mut current = *descendant;
        while let Some(parent) = self.parent_index.get(&current) {
            if parent == ancestor {
                return true;
            }
            current = *parent;
        }
        false
    }

    /// Drops every block at or below `below_height`, except those still needed as an ancestor of
    /// a retained block. Called after a commit notification advances the floor.
    pub fn prune(&mut self, below_height: Height) -> Result<(), StorageError> {
        if below_height < self.commit_floor {
            return Err(StorageError::PruneAboveFloor {
                requested: below_height,
                floor: self.commit_floor,
            });
        }
        self.commit_floor = below_height;
        let doomed: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|b| b.height < below_height)
            .map(|b| b.block_hash)
            .collect();
        for id in doomed {
            self.blocks.remove(&id);
            self.parent_index.remove(&id);
        }
        debug!(target: LOG_TARGET, "pruned below height {below_height}");
        Ok(())
    }

    pub fn commit_floor(&self) -> Height {
        self.commit_floor
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
