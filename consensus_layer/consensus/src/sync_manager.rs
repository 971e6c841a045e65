use std::sync::Arc;

use chained_hotstuff_common_types::NodeId;
use chained_hotstuff_storage::{BlockId, ChainStore};
use log::*;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::{
    payload::{FetchReqPayload, FetchRespPayload, FetchStatus},
    traits::ConsensusBus,
};

const LOG_TARGET: &str = "chained_hotstuff::sync_manager";

/// Serves block-fetch requests on a dedicated secondary loop, read-only with respect to SMR state
/// (spec §5 "to avoid head-of-line blocking behind protocol processing"). Fetch *responses* are
/// still dispatched on the main driver loop, because those drive SMR advancement.
pub struct SyncManager<B: ConsensusBus> {
    chain_store: Arc<RwLock<ChainStore>>,
    bus: Arc<B>,
    max_blocks: usize,
}

impl<B: ConsensusBus> SyncManager<B> {
    pub fn new(chain_store: Arc<RwLock<ChainStore>>, bus: Arc<B>, max_blocks: usize) -> Self {
        Self {
            chain_store,
            bus,
            max_blocks,
        }
    }

    /// Up to `max_blocks` ancestors of `block_id`, oldest first, each paired with the QC that
    /// certifies it, terminating as soon as a locally known certified block is reached.
    pub fn build_response(&self, block_id: BlockId) -> FetchRespPayload {
        let store = self.chain_store.read();
        let mut chain = Vec::new();
        let mut current = block_id;

        while chain.len() < self.max_blocks {
            let Some(block) = store.get_block(&current) else {
                break;
            };
            let Some(qc) = block.qc.clone() else {
                break;
            };
            chain.push((block.clone(), qc));
            if current == block.prev_block_hash {
                break;
            }
            current = block.prev_block_hash;
        }

        if chain.is_empty() {
            FetchRespPayload {
                status: FetchStatus::NotFound,
                blocks: Vec::new(),
            }
        } else {
            chain.reverse();
            FetchRespPayload {
                status: FetchStatus::Succeeded,
                blocks: chain,
            }
        }
    }

    pub fn build_request(missing_block_id: BlockId) -> FetchReqPayload {
        FetchReqPayload { block_id: missing_block_id }
    }

    /// Drains inbound fetch requests and answers each with a unicast response, indefinitely.
    /// Runs on its own task; `requests` is fed by the network layer's demultiplexer.
    pub async fn run(self, mut requests: mpsc::Receiver<(NodeId, FetchReqPayload)>) {
        while let Some((from, request)) = requests.recv().await {
            let response = self.build_response(request.block_id);
            debug!(
                target: LOG_TARGET,
                "answering fetch request for {} from {from} with {} blocks",
                request.block_id,
                response.blocks.len()
            );
            let msg = crate::payload::ConsensusMsg {
                payload: crate::payload::Payload::FetchResp(response),
                signer: from.clone(),
                signature: Vec::new(),
            };
            if let Err(err) = self.bus.unicast(&from, msg).await {
                warn!(target: LOG_TARGET, "failed to unicast fetch response to {from}: {err}");
            }
        }
        info!(target: LOG_TARGET, "sync manager shutting down, request channel closed");
    }
}
