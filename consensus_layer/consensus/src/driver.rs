use std::sync::Arc;

use chained_hotstuff_common_types::{Epoch, Height, Level, NodeId};
use chained_hotstuff_epoch_manager::EpochManagerReader;
use chained_hotstuff_storage::{Block, BlockId, ConsensusArgs, QuorumCert, StorageError, TimeoutCert, VoteData, Wal, WalCategory};
use log::*;
use tokio::sync::{mpsc, watch};

use crate::{
    config::Config,
    error::HotStuffError,
    message_validator::validate_payload,
    msg_pool::{AddVoteResult, MsgPool},
    payload::{
        ConsensusMsg, FetchReqPayload, FetchRespPayload, FetchStatus, Payload, ProposalPayload, SyncInfo, VotePayload,
    },
    smr::Smr,
    timer_service::{SmrPhase, TimerFired, TimerServiceHandle},
    traits::{AccessControl, BlockCommitter, BlockVerifier, ConsensusBus},
};

const LOG_TARGET: &str = "chained_hotstuff::driver";

/// A candidate block handed to the engine by the block builder, before the engine attaches
/// `justifyQC`, `proposerIndex` and `level` and signs it.
#[derive(Debug, Clone)]
pub struct CandidateBlock {
    pub height: Height,
    pub block_hash: BlockId,
    pub prev_block_hash: BlockId,
}

/// Execution's acknowledgement that a committed block finished applying. Out-of-band from the
/// commit notification itself; today the driver doesn't block on it (spec treats execution as an
/// external collaborator), but the channel exists so a future revision can.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub block_id: BlockId,
    pub height: Height,
}

/// Everything the driver needs handed to it to become a proposer for a level it just unlocked.
#[derive(Debug, Clone)]
pub struct ProposeRequest {
    pub height: Height,
    pub level: Level,
    pub epoch_id: Epoch,
    pub justify_qc: QuorumCert,
}

/// The channels the single-threaded driver loop multiplexes (spec §5). `fetch_req_rx` is
/// deliberately absent: fetch requests are served by [`SyncManager`]'s own secondary loop so they
/// never queue up behind protocol processing.
pub struct DriverChannels {
    pub inbound_rx: mpsc::Receiver<(NodeId, ConsensusMsg)>,
    pub internal_rx: mpsc::Receiver<ConsensusMsg>,
    pub proposed_block_rx: mpsc::Receiver<CandidateBlock>,
    pub committed_rx: mpsc::Receiver<BlockInfo>,
    pub timer_fired_rx: mpsc::Receiver<TimerFired>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// The top-level engine (C11): a single-threaded cooperative event loop that multiplexes network,
/// internal, block-builder, committer-ack and timer inputs into the SMR through the message
/// validator and vote pool, persisting every state-changing input to the WAL before applying it.
pub struct Driver {
    self_id: NodeId,
    smr: Smr,
    msg_pool: MsgPool,
    wal: Wal,
    epoch_manager: Arc<dyn EpochManagerReader>,
    access_control: Arc<dyn AccessControl>,
    block_verifier: Arc<dyn BlockVerifier>,
    block_committer: Arc<dyn BlockCommitter>,
    bus: Arc<dyn ConsensusBus>,
    timer: TimerServiceHandle,
    propose_request_tx: mpsc::Sender<ProposeRequest>,
    config: Config,
    /// Set for the duration of WAL replay at startup. Suppresses signing, bus publication and
    /// the external commit/fetch side effects; the dispatch logic itself is unchanged.
    replaying: bool,
}

impl Driver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        self_id: NodeId,
        smr: Smr,
        wal: Wal,
        epoch_manager: Arc<dyn EpochManagerReader>,
        access_control: Arc<dyn AccessControl>,
        block_verifier: Arc<dyn BlockVerifier>,
        block_committer: Arc<dyn BlockCommitter>,
        bus: Arc<dyn ConsensusBus>,
        timer: TimerServiceHandle,
        propose_request_tx: mpsc::Sender<ProposeRequest>,
        config: Config,
    ) -> Self {
        Self {
            self_id,
            smr,
            msg_pool: MsgPool::new(),
            wal,
            epoch_manager,
            access_control,
            block_verifier,
            block_committer,
            bus,
            timer,
            propose_request_tx,
            config,
            replaying: false,
        }
    }

    pub fn smr(&self) -> &Smr {
        &self.smr
    }

    /// Replays every WAL record from the last checkpoint forward through the normal dispatch
    /// path, with outbound effects suppressed, then clears the replaying flag (C10/P5).
    pub async fn replay(&mut self) -> Result<(), HotStuffError> {
        self.replaying = true;
        let checkpoint = self.wal.read_checkpoint()?.unwrap_or(0);
        let records = self.wal.replay_from(checkpoint)?;
        info!(target: LOG_TARGET, "replaying {} WAL records from index {checkpoint}", records.len());

        for record in records {
            match record.category {
                WalCategory::Proposal => {
                    let payload: ProposalPayload = serde_json::from_slice(&record.payload)?;
                    let proposer = payload.block.proposer.clone();
                    self.on_proposal(proposer, payload).await?;
                }
                WalCategory::Vote => {
                    let payload: VotePayload = serde_json::from_slice(&record.payload)?;
                    let author = payload.vote.author.clone();
                    self.on_vote(author, payload).await?;
                }
                WalCategory::Timeout => {
                    let vote: VoteData = serde_json::from_slice(&record.payload)?;
                    self.smr.check_and_record_vote(&vote)?;
                }
                WalCategory::Committed => {
                    let (block_id, level): (BlockId, Level) = serde_json::from_slice(&record.payload)?;
                    self.on_committed(block_id, level).await?;
                }
            }
        }

        self.replaying = false;
        info!(target: LOG_TARGET, "replay complete, entering live operation");
        Ok(())
    }

    pub async fn run(mut self, mut channels: DriverChannels) -> Result<(), HotStuffError> {
        // Arm the round timer for the level we're starting at: otherwise a node that starts up
        // (or finishes replay) without anything in flight yet never times out a silent proposer,
        // since every other call site only re-arms in response to a certificate or local timeout.
        self.arm_round_timer().await;

        loop {
            tokio::select! {
                biased;

                _ = channels.shutdown_rx.changed() => {
                    if *channels.shutdown_rx.borrow() {
                        info!(target: LOG_TARGET, "shutdown signal received, stopping driver loop");
                        return Ok(());
                    }
                }

                maybe_fired = channels.timer_fired_rx.recv() => {
                    match maybe_fired {
                        Some(fired) => self.on_timer_fired(fired).await?,
                        None => return Ok(()),
                    }
                }

                maybe_inbound = channels.inbound_rx.recv() => {
                    match maybe_inbound {
                        Some((from, msg)) => self.dispatch(from, msg).await?,
                        None => return Ok(()),
                    }
                }

                maybe_internal = channels.internal_rx.recv() => {
                    match maybe_internal {
                        Some(msg) => {
                            let from = self.self_id.clone();
                            self.dispatch(from, msg).await?;
                        }
                        None => return Ok(()),
                    }
                }

                maybe_committed = channels.committed_rx.recv() => {
                    match maybe_committed {
                        Some(info) => debug!(target: LOG_TARGET, "execution ack for block {} at height {}", info.block_id, info.height),
                        None => return Ok(()),
                    }
                }

                maybe_candidate = channels.proposed_block_rx.recv() => {
                    match maybe_candidate {
                        Some(candidate) => self.on_proposed_block(candidate).await?,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Structural validation, then epoch/level staleness filtering, dispatched to the per-variant
    /// handler. A message older than `currentLevel` or from a different epoch is discarded
    /// silently (spec §4.8); fetch requests never reach here, they're served by `SyncManager`.
    async fn dispatch(&mut self, from: NodeId, msg: ConsensusMsg) -> Result<(), HotStuffError> {
        if let Err(err) = validate_payload(&msg.payload) {
            debug!(target: LOG_TARGET, "dropping malformed {} from {from}: {err}", msg.payload.kind());
            return Ok(());
        }

        if let Some(sync_info) = msg.payload.sync_info() {
            self.absorb_sync_info(sync_info.clone()).await?;
        }

        match msg.payload {
            Payload::Proposal(p) => self.on_proposal(from, p).await,
            Payload::Vote(v) => self.on_vote(from, v).await,
            Payload::FetchReq(_) => {
                debug!(target: LOG_TARGET, "ignoring fetch request on the main loop, {from} should be served by the sync manager");
                Ok(())
            }
            Payload::FetchResp(r) => self.on_fetch_response(from, r).await,
        }
    }

    /// Every proposal and vote piggy-backs the sender's highest known QC/TC (spec §4.5, §6),
    /// which lets a node that never itself aggregated a quorum (because votes are unicast only to
    /// the next proposer, not broadcast) still advance its pacemaker and catch up on a commit
    /// between proposals, rather than having to wait for the next block to carry the same
    /// certificate as its `justifyQC`.
    async fn absorb_sync_info(&mut self, sync_info: SyncInfo) -> Result<(), HotStuffError> {
        if sync_info.highest_qc.epoch_id != self.smr.epoch_id() {
            return Ok(());
        }
        let (advanced, committed) = self.smr.process_certificates(&sync_info.highest_qc, sync_info.highest_tc.as_ref());
        if let Some((block_id, level)) = committed {
            self.on_committed(block_id, level).await?;
        }
        if advanced {
            self.msg_pool.retain_from_level(self.smr.current_level());
            self.arm_round_timer().await;
        }
        Ok(())
    }

    async fn on_proposal(&mut self, from: NodeId, p: ProposalPayload) -> Result<(), HotStuffError> {
        let block = p.block.clone();
        let level = block.consensus_args.level;
        let height = block.height;
        let epoch_id = block.consensus_args.epoch_id;

        if epoch_id != self.smr.epoch_id() {
            debug!(target: LOG_TARGET, "dropping proposal from {from}: epoch {epoch_id} != active epoch {}", self.smr.epoch_id());
            return Ok(());
        }
        if level < self.smr.current_level() {
            debug!(target: LOG_TARGET, "dropping stale proposal at level {level}, current is {}", self.smr.current_level());
            return Ok(());
        }

        if !self.replaying {
            self.wal.append(WalCategory::Proposal, &serde_json::to_vec(&p)?)?;
        }

        let committee = self.epoch_manager.get_peers(height).await?;
        let expected_proposer = committee.leader_for_level(level).cloned();
        if expected_proposer.as_ref() != Some(&block.proposer) {
            warn!(target: LOG_TARGET, "dropping proposal from {from}: {:?} is not the expected proposer at level {level}", block.proposer);
            return Ok(());
        }

        let block_bytes = serde_json::to_vec(&block)?;
        let sig_ok = self
            .access_control
            .verify(&block.proposer, &block_bytes, &p.block_signature)
            .await
            .map_err(HotStuffError::AccessControlError)?;
        if !sig_ok {
            warn!(target: LOG_TARGET, "dropping proposal from {from}: invalid block signature");
            return Ok(());
        }

        let justify_committee = self.epoch_manager.get_peers(height.saturating_sub(Height(1))).await?;
        if let Err(err) = block.justify_qc.verify(&justify_committee) {
            warn!(target: LOG_TARGET, "dropping proposal from {from}: justify QC failed verification: {err}");
            return Ok(());
        }

        match self.smr.chain_store_mut().insert(block.clone(), block.justify_qc.clone()) {
            Ok(()) => {}
            Err(StorageError::DuplicateBlock(_)) => {}
            Err(StorageError::MissingParent { parent, .. }) => {
                info!(target: LOG_TARGET, "missing ancestor {parent}, issuing a fetch request");
                self.request_fetch(parent).await?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        let safe = self.smr.safe_node(&block, &block.justify_qc);
        if safe {
            match self.block_verifier.verify(&block).await.map_err(HotStuffError::BlockVerifierError)? {
                true => self.vote_for(&block).await?,
                false => debug!(target: LOG_TARGET, "block verifier rejected block {}, letting the round time out", block.block_hash),
            }
        } else {
            debug!(target: LOG_TARGET, "SafeNode rejected proposal for block {}", block.block_hash);
        }

        let (advanced, committed) = self.smr.process_certificates(&block.justify_qc, None);
        if let Some((block_id, commit_level)) = committed {
            self.on_committed(block_id, commit_level).await?;
        }
        if advanced {
            self.msg_pool.retain_from_level(self.smr.current_level());
            self.arm_round_timer().await;
        }

        Ok(())
    }

    async fn vote_for(&mut self, block: &Block) -> Result<(), HotStuffError> {
        let self_idx = match self.epoch_manager.self_index().await? {
            Some(idx) => idx,
            None => return Ok(()),
        };
        let vote = VoteData {
            author: self.self_id.clone(),
            author_idx: self_idx,
            height: block.height,
            // The proposal's own level, not this node's (possibly still-lagging) pacemaker
            // level: every honest vote for this block must bucket together in the MsgPool
            // regardless of how far each voter's local pacemaker has otherwise advanced.
            level: block.consensus_args.level,
            epoch_id: self.smr.epoch_id(),
            block_id: Some(block.block_hash),
            new_view: false,
            signature: Vec::new(),
        };
        self.smr.check_and_record_vote(&vote)?;

        if self.replaying {
            return Ok(());
        }

        let mut signed_vote = vote.clone();
        signed_vote.signature = self
            .access_control
            .sign(&vote.signing_bytes())
            .await
            .map_err(HotStuffError::AccessControlError)?;

        let payload = Payload::Vote(VotePayload {
            sync_info: self.sync_info(),
            vote: signed_vote,
        });
        let msg = ConsensusMsg {
            payload,
            signer: self.self_id.clone(),
            signature: Vec::new(),
        };

        let committee = self.epoch_manager.get_peers(block.height).await?;
        let next_level = block.consensus_args.level.next();
        if let Some(next_proposer) = committee.leader_for_level(next_level) {
            self.bus.unicast(next_proposer, msg.clone()).await.map_err(HotStuffError::ConsensusBusError)?;
        }
        self.bus.unicast(&self.self_id, msg).await.map_err(HotStuffError::ConsensusBusError)?;
        Ok(())
    }

    async fn on_vote(&mut self, from: NodeId, v: VotePayload) -> Result<(), HotStuffError> {
        let vote = v.vote.clone();

        if vote.epoch_id != self.smr.epoch_id() {
            debug!(target: LOG_TARGET, "dropping vote from {from}: epoch mismatch");
            return Ok(());
        }
        if vote.level < self.smr.current_level() {
            debug!(target: LOG_TARGET, "dropping stale vote from {from} at level {}", vote.level);
            return Ok(());
        }

        let committee = self.epoch_manager.get_peers(vote.height).await?;
        match committee.get(vote.author_idx) {
            Some(expected) if *expected == vote.author => {}
            _ => {
                warn!(target: LOG_TARGET, "dropping vote from {from}: author index {} does not match committee", vote.author_idx);
                return Ok(());
            }
        }

        let sig_ok = self
            .access_control
            .verify(&vote.author, &vote.signing_bytes(), &vote.signature)
            .await
            .map_err(HotStuffError::AccessControlError)?;
        if !sig_ok {
            warn!(target: LOG_TARGET, "dropping vote from {from}: invalid signature");
            return Ok(());
        }

        if !self.replaying {
            self.wal.append(WalCategory::Vote, &serde_json::to_vec(&v)?)?;
        }

        match self.msg_pool.add_vote(vote, &committee) {
            AddVoteResult::Duplicate => {
                debug!(target: LOG_TARGET, "duplicate vote from {from}");
            }
            AddVoteResult::Added => {}
            AddVoteResult::QuorumReached(qc) if qc.new_view => {
                // A new-view quorum is a timeout certificate (spec §4.7 "on quorum new-view votes
                // form a TC and re-enter ProcessCertificates"), not a block QC: it never touches
                // the chain store, and it must flow through `process_certificates`'s `tc`
                // parameter so `highest_qc` keeps pointing at the last QC that actually certified
                // a block. Routing it through the `qc` parameter instead would overwrite
                // `highest_qc` with a blockless certificate, and the next proposal's
                // `justify_qc` would then fail every validator's `justify_matches_parent` check.
                let tc = TimeoutCert::from_new_view_qc(qc);
                let current_highest_qc = self.smr.highest_qc().clone();
                let (advanced, committed) = self.smr.process_certificates(&current_highest_qc, Some(&tc));
                if let Some((block_id, level)) = committed {
                    self.on_committed(block_id, level).await?;
                }
                if advanced {
                    self.msg_pool.retain_from_level(self.smr.current_level());
                    self.arm_round_timer().await;
                    let highest_qc = self.smr.highest_qc().clone();
                    self.maybe_become_proposer(&highest_qc).await?;
                }
            }
            AddVoteResult::QuorumReached(qc) => {
                if let Err(err) = self.smr.chain_store_mut().record_qc(qc.clone()) {
                    warn!(target: LOG_TARGET, "formed a QC for a block we don't have yet, deferring to a fetch: {err}");
                    if let Some(block_id) = qc.justifies_block() {
                        self.request_fetch(*block_id).await?;
                    }
                    return Ok(());
                }
                let (advanced, committed) = self.smr.process_certificates(&qc, None);
                if let Some((block_id, level)) = committed {
                    self.on_committed(block_id, level).await?;
                }
                if advanced {
                    self.msg_pool.retain_from_level(self.smr.current_level());
                    self.arm_round_timer().await;
                    self.maybe_become_proposer(&qc).await?;
                }
            }
        }

        Ok(())
    }

    async fn maybe_become_proposer(&self, qc: &QuorumCert) -> Result<(), HotStuffError> {
        let committee = self.epoch_manager.get_peers(self.smr.height()).await?;
        let Some(self_idx) = self.epoch_manager.self_index().await? else {
            return Ok(());
        };
        if committee.leader_for_level(self.smr.current_level()) == committee.get(self_idx) {
            let request = ProposeRequest {
                height: self.smr.height(),
                level: self.smr.current_level(),
                epoch_id: self.smr.epoch_id(),
                justify_qc: qc.clone(),
            };
            if self.propose_request_tx.send(request).await.is_err() {
                warn!(target: LOG_TARGET, "propose request channel closed, block builder not listening");
            }
        }
        Ok(())
    }

    async fn on_fetch_response(&mut self, from: NodeId, r: FetchRespPayload) -> Result<(), HotStuffError> {
        if r.status != FetchStatus::Succeeded {
            debug!(target: LOG_TARGET, "fetch from {from} came back empty");
            return Ok(());
        }

        let mut last_qc = None;
        for (block, qc) in r.blocks {
            let committee = self.epoch_manager.get_peers(block.height).await?;
            if let Err(err) = qc.verify(&committee) {
                warn!(target: LOG_TARGET, "dropping fetched block {}: QC failed verification: {err}", block.block_hash);
                continue;
            }
            match self.smr.chain_store_mut().insert(block.clone(), qc.clone()) {
                Ok(()) | Err(StorageError::DuplicateBlock(_)) => {
                    let _ = self.smr.chain_store_mut().record_qc(qc.clone());
                    last_qc = Some(qc);
                }
                Err(StorageError::MissingParent { parent, .. }) => {
                    debug!(target: LOG_TARGET, "still missing ancestor {parent} after fetch response, waiting for more");
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(qc) = last_qc {
            let (advanced, committed) = self.smr.process_certificates(&qc, None);
            if let Some((block_id, level)) = committed {
                self.on_committed(block_id, level).await?;
            }
            if advanced {
                self.arm_round_timer().await;
            }
        }

        Ok(())
    }

    async fn on_committed(&mut self, block_id: BlockId, level: Level) -> Result<(), HotStuffError> {
        let block = self
            .smr
            .chain_store()
            .get_block(&block_id)
            .cloned()
            .ok_or(HotStuffError::CommittedBlockMissing(block_id))?;

        if !self.replaying {
            let index = self.wal.append(WalCategory::Committed, &serde_json::to_vec(&(block_id, level))?)?;
            self.wal.write_checkpoint(index)?;
            self.block_committer.commit(&block).await.map_err(HotStuffError::BlockCommitterError)?;
        }

        self.smr.chain_store_mut().prune(block.height)?;
        self.msg_pool.retain_from_level(level);

        let next_switch_height = self.epoch_manager.next_switch_height().await?;
        if block.height > next_switch_height {
            let new_epoch = self.smr.epoch_id().next();
            self.smr.set_epoch(new_epoch);
            self.msg_pool = MsgPool::new();
            info!(target: LOG_TARGET, "epoch switch: now serving epoch {new_epoch}");
        }

        Ok(())
    }

    async fn on_proposed_block(&mut self, candidate: CandidateBlock) -> Result<(), HotStuffError> {
        let Some(self_idx) = self.epoch_manager.self_index().await? else {
            warn!(target: LOG_TARGET, "received a candidate block but this node is not a validator");
            return Ok(());
        };

        let block = Block {
            height: candidate.height,
            block_hash: candidate.block_hash,
            prev_block_hash: candidate.prev_block_hash,
            proposer: self.self_id.clone(),
            consensus_args: ConsensusArgs {
                level: self.smr.current_level(),
                proposer_index: self_idx,
                epoch_id: self.smr.epoch_id(),
            },
            justify_qc: self.smr.highest_qc().clone(),
            qc: None,
        };

        if self.replaying {
            return Ok(());
        }

        let block_signature = self
            .access_control
            .sign(&serde_json::to_vec(&block)?)
            .await
            .map_err(HotStuffError::AccessControlError)?;

        let payload = Payload::Proposal(ProposalPayload {
            sync_info: self.sync_info(),
            block: block.clone(),
            block_signature,
        });
        let msg = ConsensusMsg {
            payload,
            signer: self.self_id.clone(),
            signature: Vec::new(),
        };

        let committee = self.epoch_manager.get_peers(block.height).await?;
        self.bus.broadcast(&committee, msg.clone()).await.map_err(HotStuffError::ConsensusBusError)?;
        self.bus.unicast(&self.self_id, msg).await.map_err(HotStuffError::ConsensusBusError)?;
        Ok(())
    }

    async fn on_timer_fired(&mut self, fired: TimerFired) -> Result<(), HotStuffError> {
        if fired.epoch_id != self.smr.epoch_id() || fired.level != self.smr.current_level() {
            debug!(target: LOG_TARGET, "ignoring stale timer fire for level {}", fired.level);
            return Ok(());
        }
        if !self.smr.process_local_timeout(fired.level) {
            return Ok(());
        }

        let Some(self_idx) = self.epoch_manager.self_index().await? else {
            return Ok(());
        };
        let vote = VoteData {
            author: self.self_id.clone(),
            author_idx: self_idx,
            height: self.smr.height(),
            level: fired.level,
            epoch_id: self.smr.epoch_id(),
            block_id: None,
            new_view: true,
            signature: Vec::new(),
        };
        self.smr.check_and_record_vote(&vote)?;

        if !self.replaying {
            self.wal.append(WalCategory::Timeout, &serde_json::to_vec(&vote)?)?;

            let mut signed_vote = vote.clone();
            signed_vote.signature = self
                .access_control
                .sign(&vote.signing_bytes())
                .await
                .map_err(HotStuffError::AccessControlError)?;

            let payload = Payload::Vote(VotePayload {
                sync_info: self.sync_info(),
                vote: signed_vote,
            });
            let msg = ConsensusMsg {
                payload,
                signer: self.self_id.clone(),
                signature: Vec::new(),
            };
            let committee = self.epoch_manager.get_peers(self.smr.height()).await?;
            self.bus.broadcast(&committee, msg).await.map_err(HotStuffError::ConsensusBusError)?;
        }

        self.arm_round_timer().await;
        Ok(())
    }

    async fn request_fetch(&self, block_id: BlockId) -> Result<(), HotStuffError> {
        let payload = Payload::FetchReq(FetchReqPayload { block_id });
        let msg = ConsensusMsg {
            payload,
            signer: self.self_id.clone(),
            signature: Vec::new(),
        };
        let committee = self.epoch_manager.get_peers(self.smr.height()).await?;
        self.bus.broadcast(&committee, msg).await.map_err(HotStuffError::ConsensusBusError)
    }

    async fn arm_round_timer(&self) {
        let phase = if self.smr.last_committed_level() == self.smr.current_level() {
            SmrPhase::NewHeight
        } else {
            SmrPhase::Vote
        };
        if self
            .timer
            .schedule(
                phase,
                self.smr.height(),
                self.smr.current_level(),
                self.smr.epoch_id(),
                self.smr.last_committed_level(),
            )
            .await
            .is_err()
        {
            warn!(target: LOG_TARGET, "timer service channel closed, rounds will no longer time out");
        }
    }

    fn sync_info(&self) -> SyncInfo {
        SyncInfo {
            highest_qc: self.smr.highest_qc().clone(),
            highest_tc: self.smr.highest_tc().cloned(),
        }
    }
}
