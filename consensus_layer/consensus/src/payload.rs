use chained_hotstuff_common_types::NodeId;
use chained_hotstuff_storage::{Block, BlockId, QuorumCert, TimeoutCert, VoteData};
use serde::{Deserialize, Serialize};

/// Sync-info piggy-backed on every message: the sender's view of the highest certificates it
/// knows about, letting the receiver advance its pacemaker even off the happy path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncInfo {
    pub highest_qc: QuorumCert,
    pub highest_tc: Option<TimeoutCert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalPayload {
    pub sync_info: SyncInfo,
    pub block: Block,
    /// Signature over the block's digest, by `block.proposer`.
    pub block_signature: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotePayload {
    pub sync_info: SyncInfo,
    pub vote: VoteData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchReqPayload {
    pub block_id: BlockId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    Succeeded,
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRespPayload {
    pub status: FetchStatus,
    /// Ancestor chain, oldest first, each paired with the QC that certifies it.
    pub blocks: Vec<(Block, QuorumCert)>,
}

/// A sum type for the four inbound/outbound message shapes (spec §9 design note: "prefer a sum
/// type... with each variant's required fields non-optional by construction"). Required
/// sub-fields a protobuf union would leave nullable are instead plain, mandatory fields here, so
/// [`crate::message_validator::validate_payload`] only has to check cross-field business shape,
/// not presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    Proposal(ProposalPayload),
    Vote(VotePayload),
    FetchReq(FetchReqPayload),
    FetchResp(FetchRespPayload),
}

impl Payload {
    /// The sync-info piggy-backed on this message, if any (proposals and votes carry one;
    /// fetch requests/responses don't).
    pub fn sync_info(&self) -> Option<&SyncInfo> {
        match self {
            Payload::Proposal(p) => Some(&p.sync_info),
            Payload::Vote(v) => Some(&v.sync_info),
            Payload::FetchReq(_) | Payload::FetchResp(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Proposal(_) => "PROPOSAL",
            Payload::Vote(_) => "VOTE",
            Payload::FetchReq(_) => "BLOCK_FETCH_REQ",
            Payload::FetchResp(_) => "BLOCK_FETCH_RESP",
        }
    }
}

/// The detached signature envelope around a [`Payload`]: `signature` is computed over the
/// canonical serialization of `payload` alone (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusMsg {
    pub payload: Payload,
    pub signer: NodeId,
    pub signature: Vec<u8>,
}

/// What [`crate::message_validator::validate_payload`] can reject a message for. Structural only
/// (spec §4.2 "no semantic validation here"): authority, safety and epoch checks live in
/// `SafetyRules`/the driver.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MessageValidationError {
    #[error("vote is neither a new-view vote nor carries a block id")]
    VoteMissingTarget,
    #[error("new-view vote carries a non-empty block id")]
    NewViewVoteHasBlockId,
    #[error("fetch response reports success but carries no blocks")]
    SucceededFetchWithNoBlocks,
    #[error("fetch response reports failure but carries blocks")]
    FailedFetchWithBlocks,
    #[error("proposal block does not declare a parent (prev_block_hash) matching its justify QC")]
    ProposalJustifyMismatch,
}
