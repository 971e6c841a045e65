use chained_hotstuff_common_types::{Epoch, Height};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EpochManagerError {
    #[error("no governance snapshot recorded at or before height {0}")]
    NoSnapshotAt(Height),

    #[error("validator index {0} is not valid for the epoch at the queried height")]
    InvalidValidatorIndex(u64),

    #[error("epoch {0} has no recorded validator set")]
    UnknownEpoch(Epoch),
}
