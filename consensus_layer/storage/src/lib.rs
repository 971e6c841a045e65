//   SPDX-License-Identifier: BSD-3-Clause

//! The consensus-visible slice of the chain: block/QC domain types, the in-memory pool that backs
//! them (`ChainStore`) and the durable write-ahead log (`Wal`) that survives a restart. Execution
//! and the real block/state store live outside this crate.

mod block;
mod chain_store;
mod digest;
mod error;
mod quorum_cert;
mod vote_data;
mod wal;

pub use block::{Block, ConsensusArgs};
pub use chain_store::{ChainStore, ExternalBlockStore};
pub use digest::BlockId;
pub use error::{StorageError, WalError};
pub use quorum_cert::{QcVerifyError, QuorumCert, TimeoutCert};
pub use vote_data::VoteData;
pub use wal::{Wal, WalCategory, WalRecord};
