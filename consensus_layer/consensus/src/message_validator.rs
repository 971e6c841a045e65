use crate::payload::{MessageValidationError, Payload};

/// Structural well-formedness check on an inbound [`Payload`] (C2). Everything the wire format
/// leaves as a runtime-nullable field in the original protobuf union is a mandatory Rust field
/// here, so only the cross-field business shape needs checking: a vote is either a new-view vote
/// or targets a specific block, never both or neither; a fetch response's block list agrees with
/// its reported status; a proposal's block actually extends the QC it carries.
///
/// Mirrors `ValidateMessageBasicInfo`'s per-type dispatch, minus the presence checks the type
/// system already makes impossible to violate.
pub fn validate_payload(payload: &Payload) -> Result<(), MessageValidationError> {
    match payload {
        Payload::Proposal(proposal) => {
            if !proposal.block.justify_matches_parent() {
                return Err(MessageValidationError::ProposalJustifyMismatch);
            }
            Ok(())
        }
        Payload::Vote(vote) => {
            let v = &vote.vote;
            match (v.new_view, v.block_id.is_some()) {
                (true, true) => Err(MessageValidationError::NewViewVoteHasBlockId),
                (false, false) => Err(MessageValidationError::VoteMissingTarget),
                _ => Ok(()),
            }
        }
        Payload::FetchReq(_) => Ok(()),
        Payload::FetchResp(resp) => {
            use crate::payload::FetchStatus;
            match resp.status {
                FetchStatus::Succeeded if resp.blocks.is_empty() => {
                    Err(MessageValidationError::SucceededFetchWithNoBlocks)
                }
                FetchStatus::NotFound if !resp.blocks.is_empty() => {
                    Err(MessageValidationError::FailedFetchWithBlocks)
                }
                _ => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chained_hotstuff_common_types::{Epoch, Height, Level, NodeId, ValidatorIndex};
    use chained_hotstuff_storage::{Block, BlockId, ConsensusArgs, QuorumCert, VoteData};

    use super::*;
    use crate::payload::{FetchRespPayload, FetchStatus, SyncInfo, VotePayload};

    fn sync_info() -> SyncInfo {
        SyncInfo {
            highest_qc: QuorumCert::genesis(Epoch(0)),
            highest_tc: None,
        }
    }

    #[test]
    fn vote_with_neither_new_view_nor_block_id_is_rejected() {
        let vote = VoteData {
            author: NodeId::new(vec![1]),
            author_idx: ValidatorIndex(0),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            block_id: None,
            new_view: false,
            signature: Vec::new(),
        };
        let payload = Payload::Vote(VotePayload { sync_info: sync_info(), vote });
        assert_eq!(validate_payload(&payload), Err(MessageValidationError::VoteMissingTarget));
    }

    #[test]
    fn new_view_vote_with_block_id_is_rejected() {
        let vote = VoteData {
            author: NodeId::new(vec![1]),
            author_idx: ValidatorIndex(0),
            height: Height(1),
            level: Level(1),
            epoch_id: Epoch(0),
            block_id: Some(BlockId::from_bytes([1u8; 32])),
            new_view: true,
            signature: Vec::new(),
        };
        let payload = Payload::Vote(VotePayload { sync_info: sync_info(), vote });
        assert_eq!(validate_payload(&payload), Err(MessageValidationError::NewViewVoteHasBlockId));
    }

    #[test]
    fn succeeded_fetch_resp_with_no_blocks_is_rejected() {
        let payload = Payload::FetchResp(FetchRespPayload {
            status: FetchStatus::Succeeded,
            blocks: Vec::new(),
        });
        assert_eq!(
            validate_payload(&payload),
            Err(MessageValidationError::SucceededFetchWithNoBlocks)
        );
    }

    #[test]
    fn proposal_with_mismatched_justify_is_rejected() {
        let block = Block {
            height: Height(5),
            block_hash: BlockId::from_bytes([5u8; 32]),
            prev_block_hash: BlockId::from_bytes([4u8; 32]),
            proposer: NodeId::new(vec![1]),
            consensus_args: ConsensusArgs {
                level: Level(5),
                proposer_index: ValidatorIndex(0),
                epoch_id: Epoch(0),
            },
            justify_qc: QuorumCert::genesis(Epoch(0)),
            qc: None,
        };
        let payload = Payload::Proposal(crate::payload::ProposalPayload {
            sync_info: sync_info(),
            block,
            block_signature: Vec::new(),
        });
        assert_eq!(validate_payload(&payload), Err(MessageValidationError::ProposalJustifyMismatch));
    }
}
