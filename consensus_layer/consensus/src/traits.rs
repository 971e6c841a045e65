use async_trait::async_trait;
use chained_hotstuff_common_types::{Committee, NodeId};
use chained_hotstuff_storage::Block;

use crate::payload::ConsensusMsg;

/// Signs and verifies payload bytes on behalf of this node (spec §1 "out of scope, treated as an
/// external collaborator"). The engine never touches key material directly.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn sign(&self, bytes: &[u8]) -> anyhow::Result<Vec<u8>>;
    async fn verify(&self, signer: &NodeId, bytes: &[u8], signature: &[u8]) -> anyhow::Result<bool>;
}

/// The block production/execution pipeline's acceptance check. `Ok(true)` means "I can vote for
/// this", `Ok(false)` means "let the round time out" (spec §4.10).
#[async_trait]
pub trait BlockVerifier: Send + Sync {
    async fn verify(&self, block: &Block) -> anyhow::Result<bool>;
}

/// Receives committed blocks in strictly increasing height order (spec §5 ordering guarantee) and
/// reports back whether execution accepted them.
#[async_trait]
pub trait BlockCommitter: Send + Sync {
    async fn commit(&self, block: &Block) -> anyhow::Result<()>;
}

/// Publish/subscribe network bus with unicast and broadcast primitives (spec §6). Publishes are
/// fire-and-forget from the driver's point of view; the bus owns its own buffering.
#[async_trait]
pub trait ConsensusBus: Send + Sync {
    async fn unicast(&self, to: &NodeId, msg: ConsensusMsg) -> anyhow::Result<()>;
    async fn broadcast(&self, committee: &Committee, msg: ConsensusMsg) -> anyhow::Result<()>;
}
