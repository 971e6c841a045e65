use std::collections::HashMap;

use chained_hotstuff_common_types::{Committee, Height, Level, ValidatorIndex};
use chained_hotstuff_storage::{BlockId, QuorumCert, VoteData};
use log::debug;

const LOG_TARGET: &str = "chained_hotstuff::msg_pool";

/// How many levels below the pacemaker's current level a bucket is still kept around for, so a
/// vote arriving slightly out of order isn't dropped as stale.
const LOOKBACK_LEVELS: u64 = 2;

/// What a bucket is accumulating votes toward: a specific block, or a new-view (timeout) at a
/// level where no block could be agreed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Block(BlockId),
    NewView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BucketKey {
    height: Height,
    level: Level,
    kind: VoteKind,
}

#[derive(Debug, Default)]
struct Bucket {
    votes: HashMap<u64, VoteData>,
    qc_emitted: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AddVoteResult {
    Duplicate,
    Added,
    QuorumReached(QuorumCert),
}

/// Dedup/aggregation of votes by `(height, level, voteKind)` (C3). One pool instance is scoped to
/// a single epoch; the driver installs a fresh one on every epoch switch rather than this type
/// tracking epoch transitions itself.
#[derive(Debug, Default)]
pub struct MsgPool {
    buckets: HashMap<BucketKey, Bucket>,
}

impl MsgPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buckets further votes past quorum are retained (not immediately cleared) so late
    /// validators are still recorded in case the QC needs to be re-derived with more signatures.
    pub fn add_vote(&mut self, vote: VoteData, committee: &Committee) -> AddVoteResult {
        let kind = if vote.new_view {
            VoteKind::NewView
        } else {
            match vote.block_id {
                Some(block_id) => VoteKind::Block(block_id),
                None => VoteKind::NewView,
            }
        };
        let key = BucketKey {
            height: vote.height,
            level: vote.level,
            kind,
        };

        let bucket = self.buckets.entry(key).or_default();
        let author_idx = vote.author_idx.as_u64();
        if bucket.votes.contains_key(&author_idx) {
            return AddVoteResult::Duplicate;
        }
        bucket.votes.insert(author_idx, vote);

        let quorum = committee.quorum_threshold();
        if bucket.votes.len() < quorum {
            debug!(
                target: LOG_TARGET,
                "vote added to bucket ({:?}, {:?}, {:?}): {}/{}",
                key.height,
                key.level,
                key.kind,
                bucket.votes.len(),
                quorum
            );
            return AddVoteResult::Added;
        }

        if bucket.qc_emitted {
            return AddVoteResult::Added;
        }
        bucket.qc_emitted = true;

        let mut votes: Vec<VoteData> = bucket.votes.values().cloned().collect();
        votes.sort_by_key(|v| v.author_idx.as_u64());

        let (block_id, new_view) = match key.kind {
            VoteKind::Block(id) => (Some(id), false),
            VoteKind::NewView => (None, true),
        };

        AddVoteResult::QuorumReached(QuorumCert {
            block_id,
            height: key.height,
            level: key.level,
            epoch_id: votes[0].epoch_id,
            new_view,
            votes,
        })
    }

    /// Drops every bucket at or below `advanced_level - LOOKBACK_LEVELS`, called after SMR
    /// advances to a new level.
    pub fn retain_from_level(&mut self, advanced_level: Level) {
        let floor = advanced_level.saturating_sub(Level(LOOKBACK_LEVELS));
        self.buckets.retain(|key, _| key.level > floor);
    }

    pub fn bucket_len(&self, height: Height, level: Level, kind: VoteKind) -> usize {
        self.buckets
            .get(&BucketKey { height, level, kind })
            .map(|b| b.votes.len())
            .unwrap_or(0)
    }
}
