use chained_hotstuff_common_types::{Epoch, Height, Level};
use chained_hotstuff_epoch_manager::EpochManagerError;
use chained_hotstuff_storage::{BlockId, QcVerifyError, StorageError, WalError};

use crate::payload::MessageValidationError;

#[derive(Debug, thiserror::Error)]
pub enum HotStuffError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Epoch manager error: {0}")]
    EpochManagerError(#[from] EpochManagerError),
    #[error("Message validation error: {0}")]
    MessageValidationError(#[from] MessageValidationError),
    #[error("Quorum certificate verification error: {0}")]
    QcVerifyError(#[from] QcVerifyError),
    #[error("WAL error: {0}")]
    WalError(#[from] WalError),
    #[error("Access control error: {0}")]
    AccessControlError(anyhow::Error),
    #[error("Block verifier error: {0}")]
    BlockVerifierError(anyhow::Error),
    #[error("Block committer error: {0}")]
    BlockCommitterError(anyhow::Error),
    #[error("Consensus bus error: {0}")]
    ConsensusBusError(anyhow::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Committed block {0} is not present in the chain store")]
    CommittedBlockMissing(BlockId),
    #[error("Safety violation: {0}")]
    SafetyViolation(#[from] SafetyViolation),
}

/// Distinct from [`HotStuffError`]'s catch-all because safety violations are never silently
/// dropped: they are always refused and logged at error level, per spec §4.10.
#[derive(Debug, thiserror::Error)]
pub enum SafetyViolation {
    #[error("would vote twice at (height={height}, level={level}, epoch={epoch})")]
    WouldDoubleVote { height: Height, level: Level, epoch: Epoch },
}
