use std::slice::Iter;

use serde::{Deserialize, Serialize};

use crate::{NodeId, ValidatorIndex};

/// The ordered validator set for one epoch. Index position in this list *is* the
/// [`ValidatorIndex`] used everywhere else (vote bitmaps, leader rotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    members: Vec<NodeId>,
}

impl Committee {
    pub fn new(members: Vec<NodeId>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: ValidatorIndex) -> Option<&NodeId> {
        self.members.get(index.as_usize())
    }

    pub fn index_of(&self, node_id: &NodeId) -> Option<ValidatorIndex> {
        self.members
            .iter()
            .position(|member| member == node_id)
            .map(|pos| ValidatorIndex(pos as u64))
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.members.iter().any(|member| member == node_id)
    }

    pub fn iter(&self) -> Iter<'_, NodeId> {
        self.members.iter()
    }

    /// `⌈2n/3⌉`, i.e. `2f+1` for `n=3f+1`: the smallest vote count that cannot be matched by a
    /// disjoint faulty set of up to `f = ⌊(n-1)/3⌋` members.
    pub fn quorum_threshold(&self) -> usize {
        let n = self.members.len();
        (2 * n).div_ceil(3)
    }

    /// `leader = level mod n`, round-robin over the committee in index order.
    pub fn leader_for_level(&self, level: crate::Level) -> Option<&NodeId> {
        if self.members.is_empty() {
            return None;
        }
        let idx = (level.as_u64() as usize) % self.members.len();
        self.members.get(idx)
    }
}

impl<'a> IntoIterator for &'a Committee {
    type IntoIter = Iter<'a, NodeId>;
    type Item = &'a NodeId;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
