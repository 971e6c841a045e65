use std::collections::BTreeSet;

use chained_hotstuff_common_types::{Committee, Epoch, Height, Level};
use serde::{Deserialize, Serialize};

use crate::{BlockId, VoteData};

/// Certifies either a block or a new-view for a `(height, level)`, per spec §3. A [`TimeoutCert`]
/// is the same shape with `new_view = true` and an empty `block_id`; see [`TimeoutCert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCert {
    pub block_id: Option<BlockId>,
    pub height: Height,
    pub level: Level,
    pub epoch_id: Epoch,
    pub new_view: bool,
    /// Sorted by author index so that the same vote set serializes identically on every node
    /// (spec §5 "QCs are deterministic in content").
    pub votes: Vec<VoteData>,
}

/// What can go wrong verifying a [`QuorumCert`]/[`TimeoutCert`] against a committee snapshot.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QcVerifyError {
    #[error("quorum certificate has {actual} votes, needs at least {required}")]
    BelowQuorum { required: usize, actual: usize },

    #[error("vote from author index {0} appears more than once")]
    DuplicateAuthor(u64),

    #[error("vote from author index {0} is not a member of the applicable validator set")]
    UnknownAuthor(u64),

    #[error("vote (height={vote_height}, level={vote_level}, epoch={vote_epoch}) does not match certificate (height={cert_height}, level={cert_level}, epoch={cert_epoch})")]
    Mismatched {
        vote_height: u64,
        vote_level: u64,
        vote_epoch: u64,
        cert_height: u64,
        cert_level: u64,
        cert_epoch: u64,
    },
}

impl QuorumCert {
    pub fn is_new_view(&self) -> bool {
        self.new_view
    }

    pub fn justifies_block(&self) -> Option<&BlockId> {
        if self.new_view {
            None
        } else {
            self.block_id.as_ref()
        }
    }

    /// The bootstrap QC for the genesis block: a trusted constant every validator is configured
    /// with out of band, not something any committee ever actually voted on.
    pub fn is_genesis(&self) -> bool {
        !self.new_view && self.height == Height::zero() && self.block_id == Some(BlockId::zero())
    }

    /// Validates vote count, author uniqueness and `(height, level, epoch)` cohesion against the
    /// committee effective at this QC. Does not check signatures; that belongs to the
    /// `AccessControl` capability at the call site, which has the key material.
    ///
    /// Mirrors `countNumFromVotes`'s exclusion rule: a vote naming a different `block_id` than
    /// the certificate counts toward neither tally and is simply not present in `self.votes`
    /// once a caller has filtered correctly, so a QC containing one is rejected outright here.
    ///
    /// The genesis QC is exempt: it certifies a block no one proposed or voted on, so it carries
    /// no votes to check.
    pub fn verify(&self, committee: &Committee) -> Result<(), QcVerifyError> {
        if self.is_genesis() {
            return Ok(());
        }

        let required = committee.quorum_threshold();
        if self.votes.len() < required {
            return Err(QcVerifyError::BelowQuorum {
                required,
                actual: self.votes.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for vote in &self.votes {
            if vote.height != self.height || vote.level != self.level || vote.epoch_id != self.epoch_id {
                return Err(QcVerifyError::Mismatched {
                    vote_height: vote.height.as_u64(),
                    vote_level: vote.level.as_u64(),
                    vote_epoch: vote.epoch_id.as_u64(),
                    cert_height: self.height.as_u64(),
                    cert_level: self.level.as_u64(),
                    cert_epoch: self.epoch_id.as_u64(),
                });
            }
            if self.new_view {
                if !vote.new_view {
                    return Err(QcVerifyError::Mismatched {
                        vote_height: vote.height.as_u64(),
                        vote_level: vote.level.as_u64(),
                        vote_epoch: vote.epoch_id.as_u64(),
                        cert_height: self.height.as_u64(),
                        cert_level: self.level.as_u64(),
                        cert_epoch: self.epoch_id.as_u64(),
                    });
                }
            } else if vote.block_id.as_ref() != self.block_id.as_ref() {
                return Err(QcVerifyError::Mismatched {
                    vote_height: vote.height.as_u64(),
                    vote_level: vote.level.as_u64(),
                    vote_epoch: vote.epoch_id.as_u64(),
                    cert_height: self.height.as_u64(),
                    cert_level: self.level.as_u64(),
                    cert_epoch: self.epoch_id.as_u64(),
                });
            }

            if committee.index_of(&vote.author).map(|idx| idx.as_u64()) != Some(vote.author_idx.as_u64()) {
                return Err(QcVerifyError::UnknownAuthor(vote.author_idx.as_u64()));
            }
            if !seen.insert(vote.author_idx.as_u64()) {
                return Err(QcVerifyError::DuplicateAuthor(vote.author_idx.as_u64()));
            }
        }

        Ok(())
    }

    pub fn genesis(epoch_id: Epoch) -> Self {
        Self {
            block_id: Some(BlockId::zero()),
            height: Height::zero(),
            level: Level::zero(),
            epoch_id,
            new_view: false,
            votes: Vec::new(),
        }
    }
}

/// Formed from quorum new-view votes at a level when no block QC was reached in time. Kept as a
/// distinct type from [`QuorumCert`] (rather than an alias) so call sites can't accidentally pass
/// a block QC where liveness logic expects a timeout certificate, even though the wire shape is
/// identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutCert(QuorumCert);

impl TimeoutCert {
    /// `qc` must have `new_view = true` and no `block_id`; this is the shape `QuorumCert::verify`
    /// already enforces for any new-view certificate.
    pub fn from_new_view_qc(qc: QuorumCert) -> Self {
        debug_assert!(qc.new_view);
        debug_assert!(qc.block_id.is_none());
        Self(qc)
    }

    pub fn height(&self) -> Height {
        self.0.height
    }

    pub fn level(&self) -> Level {
        self.0.level
    }

    pub fn epoch_id(&self) -> Epoch {
        self.0.epoch_id
    }

    pub fn as_quorum_cert(&self) -> &QuorumCert {
        &self.0
    }

    pub fn verify(&self, committee: &Committee) -> Result<(), QcVerifyError> {
        self.0.verify(committee)
    }
}

#[cfg(test)]
mod tests {
    use chained_hotstuff_common_types::NodeId;

    use super::*;

    fn committee(n: u64) -> Committee {
        Committee::new((0..n).map(|i| NodeId::new(vec![i as u8])).collect())
    }

    fn vote(committee: &Committee, idx: u64, block_id: BlockId) -> VoteData {
        VoteData {
            author: committee.get(idx.into()).unwrap().clone(),
            author_idx: idx.into(),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            block_id: Some(block_id),
            new_view: false,
            signature: Vec::new(),
        }
    }

    #[test]
    fn rejects_below_quorum() {
        let committee = committee(4);
        let block_id = BlockId::from_bytes([7u8; 32]);
        let qc = QuorumCert {
            block_id: Some(block_id),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            new_view: false,
            votes: vec![vote(&committee, 0, block_id), vote(&committee, 1, block_id)],
        };
        assert_eq!(
            qc.verify(&committee),
            Err(QcVerifyError::BelowQuorum { required: 3, actual: 2 })
        );
    }

    #[test]
    fn rejects_duplicate_author() {
        let committee = committee(4);
        let block_id = BlockId::from_bytes([7u8; 32]);
        let qc = QuorumCert {
            block_id: Some(block_id),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            new_view: false,
            votes: vec![
                vote(&committee, 0, block_id),
                vote(&committee, 0, block_id),
                vote(&committee, 1, block_id),
            ],
        };
        assert_eq!(qc.verify(&committee), Err(QcVerifyError::DuplicateAuthor(0)));
    }

    #[test]
    fn accepts_exact_quorum() {
        let committee = committee(4);
        let block_id = BlockId::from_bytes([7u8; 32]);
        let qc = QuorumCert {
            block_id: Some(block_id),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            new_view: false,
            votes: vec![vote(&committee, 0, block_id), vote(&committee, 1, block_id), vote(&committee, 2, block_id)],
        };
        assert!(qc.verify(&committee).is_ok());
    }

    #[test]
    fn vote_for_different_block_is_rejected() {
        let committee = committee(4);
        let block_id = BlockId::from_bytes([7u8; 32]);
        let other = BlockId::from_bytes([9u8; 32]);
        let qc = QuorumCert {
            block_id: Some(block_id),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            new_view: false,
            votes: vec![vote(&committee, 0, block_id), vote(&committee, 1, block_id), vote(&committee, 2, other)],
        };
        assert!(qc.verify(&committee).is_err());
    }
}
