use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A validator's slot within the committee for a given epoch. Not stable across epochs: the same
/// [`crate::NodeId`] can hold a different index after a validator-set rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorIndex(pub u64);

impl ValidatorIndex {
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u64> for ValidatorIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for ValidatorIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
