use chained_hotstuff_common_types::Height;
use thiserror::Error;

use crate::BlockId;

/// Failures from [`crate::ChainStore`]. None of these are fatal on their own; the driver decides
/// whether a failed insert means "drop the message" or "go fetch the missing ancestor".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("block {0} already present in the chain store")]
    DuplicateBlock(BlockId),

    #[error("parent block {parent} of block {block} is not in the chain store")]
    MissingParent { block: BlockId, parent: BlockId },

    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    #[error("cannot prune below height {requested}: current commit floor is {floor}")]
    PruneAboveFloor { requested: Height, floor: Height },
}

/// Failures from [`crate::Wal`]. Per the failure semantics table, every one of these is fatal:
/// the process must stop rather than continue with a durability guarantee it can't back up.
#[derive(Debug, Error)]
pub enum WalError {
    #[error("failed to open WAL segment {path}: {source}")]
    OpenSegment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append WAL record: {source}")]
    Append {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fsync WAL segment: {source}")]
    Fsync {
        #[source]
        source: std::io::Error,
    },

    #[error("WAL record at byte offset {offset} failed CRC check (expected {expected:08x}, got {actual:08x})")]
    CrcMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    #[error("WAL record at byte offset {offset} is truncated")]
    Truncated { offset: u64 },

    #[error("unknown WAL record category {0}")]
    UnknownCategory(u8),
}
