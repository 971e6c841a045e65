//! Shared fakes for the end-to-end scenarios in spec §8: an in-process network bus that routes
//! `unicast`/`broadcast` straight into each node's inbound channel, and no-op collaborators for
//! signing, block verification and commit (crypto and execution are out of scope for this crate,
//! spec §1).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chained_hotstuff_common_types::{Committee, Epoch, Height, Level, NodeId, ValidatorIndex};
use chained_hotstuff_consensus::{
    AccessControl, BlockCommitter, BlockInfo, BlockVerifier, CandidateBlock, Config, ConsensusBus, ConsensusMsg, Driver,
    DriverChannels, Pacemaker, ProposeRequest, SafetyRules, Smr, TimerService,
};
use chained_hotstuff_epoch_manager::InMemoryEpochManager;
use chained_hotstuff_storage::{Block, BlockId, ChainStore, ConsensusArgs, QuorumCert};
use tokio::sync::{mpsc, watch};

pub struct NullAccessControl;

#[async_trait]
impl AccessControl for NullAccessControl {
    async fn sign(&self, _bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn verify(&self, _signer: &NodeId, _bytes: &[u8], _signature: &[u8]) -> anyhow::Result<bool> {
        Ok(true)
    }
}

pub struct AcceptAllBlocks;

#[async_trait]
impl BlockVerifier for AcceptAllBlocks {
    async fn verify(&self, _block: &Block) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[derive(Default)]
pub struct RecordingCommitter {
    pub committed: Mutex<Vec<Block>>,
}

#[async_trait]
impl BlockCommitter for RecordingCommitter {
    async fn commit(&self, block: &Block) -> anyhow::Result<()> {
        self.committed.lock().unwrap().push(block.clone());
        Ok(())
    }
}

/// Routes `unicast`/`broadcast` to each registered node's inbound channel, standing in for the
/// publish/subscribe network bus (spec §6) within a single test process.
#[derive(Clone, Default)]
pub struct InProcessBus {
    routes: Arc<Mutex<HashMap<NodeId, mpsc::Sender<(NodeId, ConsensusMsg)>>>>,
}

impl InProcessBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node: NodeId, inbound_tx: mpsc::Sender<(NodeId, ConsensusMsg)>) {
        self.routes.lock().unwrap().insert(node, inbound_tx);
    }
}

#[async_trait]
impl ConsensusBus for InProcessBus {
    async fn unicast(&self, to: &NodeId, msg: ConsensusMsg) -> anyhow::Result<()> {
        let sender = self.routes.lock().unwrap().get(to).cloned();
        if let Some(sender) = sender {
            let _ = sender.send((msg.signer.clone(), msg)).await;
        }
        Ok(())
    }

    async fn broadcast(&self, committee: &Committee, msg: ConsensusMsg) -> anyhow::Result<()> {
        let senders: Vec<_> = {
            let routes = self.routes.lock().unwrap();
            committee.iter().filter_map(|member| routes.get(member).cloned()).collect()
        };
        for sender in senders {
            let _ = sender.send((msg.signer.clone(), msg.clone())).await;
        }
        Ok(())
    }
}

/// Deterministic per-height block id, so every node's independently-run "block builder" produces
/// byte-identical blocks for the same height without any real transaction content to hash.
pub fn block_id_for_height(height: u64) -> BlockId {
    if height == 0 {
        BlockId::zero()
    } else {
        BlockId::digest(&[&height.to_le_bytes()])
    }
}

pub fn committee(n: u64) -> Committee {
    Committee::new((0..n).map(|i| NodeId::new(vec![i as u8])).collect())
}

fn genesis_block() -> Block {
    Block {
        height: Height::zero(),
        block_hash: BlockId::zero(),
        prev_block_hash: BlockId::zero(),
        proposer: NodeId::new(vec![0xFF]),
        consensus_args: ConsensusArgs {
            level: Level::zero(),
            proposer_index: ValidatorIndex(0),
            epoch_id: Epoch::zero(),
        },
        justify_qc: QuorumCert::genesis(Epoch::zero()),
        qc: Some(QuorumCert::genesis(Epoch::zero())),
    }
}

/// A fully wired node: the spawned driver task, the registered bus route, a propose-request
/// forwarder standing in for the external block builder, and the shared handles a test needs to
/// poke at (committed blocks, shutdown, candidate injection).
///
/// `_internal_tx`/`_committed_tx` are unused by any test today but must outlive the driver: if the
/// sender half of `internal_rx`/`committed_rx` were dropped, `recv()` would return `None` and the
/// driver's select loop would exit as though told to shut down.
pub struct Node {
    pub id: NodeId,
    pub committer: Arc<RecordingCommitter>,
    pub proposed_block_tx: mpsc::Sender<CandidateBlock>,
    pub shutdown_tx: watch::Sender<bool>,
    /// The most recent `ProposeRequest` this node's driver asked the (stand-in) block builder to
    /// fill, if any — lets a test observe the pacemaker's level/`justify_qc` after it advances
    /// without reaching into the driver, which is owned by its spawned task.
    pub last_propose_request: Arc<Mutex<Option<ProposeRequest>>>,
    _internal_tx: mpsc::Sender<ConsensusMsg>,
    _committed_tx: mpsc::Sender<BlockInfo>,
}

/// Builds and spawns `n` nodes sharing one [`InProcessBus`] and one genesis epoch, each at
/// `(height=1, level=1)` just past the genesis QC, matching "initial state on startup: NEW_HEIGHT
/// at the level of the replayed highestQC" (spec §4.8) for a chain whose only certified block so
/// far is genesis at level 0.
pub fn spawn_cluster(n: u64, wal_root: &std::path::Path) -> (Vec<Node>, InProcessBus) {
    let bus = InProcessBus::new();
    let members = committee(n);
    let mut nodes = Vec::new();

    for i in 0..n {
        let self_id = NodeId::new(vec![i as u8]);
        let self_idx = ValidatorIndex(i);

        let mut chain_store = ChainStore::new();
        chain_store.insert(genesis_block(), QuorumCert::genesis(Epoch::zero())).unwrap();

        let pacemaker = Pacemaker::new(Height(1), Level(1), Epoch::zero(), QuorumCert::genesis(Epoch::zero()));
        let safety = SafetyRules::new(QuorumCert::genesis(Epoch::zero()));
        let smr = Smr::new(pacemaker, safety, chain_store);

        let wal_dir = wal_root.join(format!("node-{i}"));
        let wal = chained_hotstuff_storage::Wal::open(&wal_dir).unwrap();

        let epoch_manager = Arc::new(InMemoryEpochManager::genesis(
            Epoch::zero(),
            members.clone(),
            Height(1_000_000),
            Some(self_idx),
        ));

        let (fired_tx, fired_rx) = mpsc::channel(16);
        let (timer_service, timer_handle) =
            TimerService::new(std::time::Duration::from_secs(5), std::time::Duration::from_secs(2), std::time::Duration::from_secs(30), fired_tx);
        tokio::spawn(timer_service.run());

        let (propose_request_tx, mut propose_request_rx) = mpsc::channel::<ProposeRequest>(16);
        let (proposed_block_tx, proposed_block_rx) = mpsc::channel::<CandidateBlock>(16);

        // Stands in for the external block builder: turns a propose request into a candidate
        // block extending the deterministic per-height chain.
        let builder_tx = proposed_block_tx.clone();
        let last_propose_request = Arc::new(Mutex::new(None));
        let last_propose_request_for_task = last_propose_request.clone();
        tokio::spawn(async move {
            while let Some(req) = propose_request_rx.recv().await {
                let height = req.height.as_u64();
                let candidate = CandidateBlock {
                    height: req.height,
                    block_hash: block_id_for_height(height),
                    prev_block_hash: block_id_for_height(height.saturating_sub(1)),
                };
                *last_propose_request_for_task.lock().unwrap() = Some(req);
                if builder_tx.send(candidate).await.is_err() {
                    break;
                }
            }
        });

        let (inbound_tx, inbound_rx) = mpsc::channel(256);
        let (internal_tx, internal_rx) = mpsc::channel(16);
        let (committed_tx, committed_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        bus.register(self_id.clone(), inbound_tx);

        let committer = Arc::new(RecordingCommitter::default());

        let driver = Driver::new(
            self_id.clone(),
            smr,
            wal,
            epoch_manager,
            Arc::new(NullAccessControl),
            Arc::new(AcceptAllBlocks),
            committer.clone(),
            Arc::new(bus.clone()),
            timer_handle,
            propose_request_tx,
            Config::default(),
        );

        let channels = DriverChannels {
            inbound_rx,
            internal_rx,
            proposed_block_rx,
            committed_rx,
            timer_fired_rx: fired_rx,
            shutdown_rx,
        };

        tokio::spawn(driver.run(channels));

        nodes.push(Node {
            id: self_id,
            committer,
            proposed_block_tx,
            shutdown_tx,
            last_propose_request,
            _internal_tx: internal_tx,
            _committed_tx: committed_tx,
        });
    }

    (nodes, bus)
}
