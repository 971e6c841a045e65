//   SPDX-License-Identifier: BSD-3-Clause

//! The Chained-HotStuff BFT engine: pacemaker (liveness), safety rules, the message-validation
//! and vote-aggregation pipeline, the per-level timer service, block-fetch sync, and the
//! single-threaded driver event loop that ties them together (spec components C2, C3, C5-C9,
//! C11). Block storage, governance and the write-ahead log live in sibling crates; this crate
//! only reads through their traits.

pub mod config;
pub mod driver;
pub mod error;
pub mod message_validator;
pub mod msg_pool;
pub mod pacemaker;
pub mod payload;
pub mod safety_rules;
pub mod smr;
pub mod sync_manager;
pub mod timer_service;
pub mod traits;

pub use config::Config;
pub use driver::{BlockInfo, CandidateBlock, Driver, DriverChannels, ProposeRequest};
pub use error::{HotStuffError, SafetyViolation};
pub use msg_pool::{AddVoteResult, MsgPool, VoteKind};
pub use pacemaker::Pacemaker;
pub use payload::{
    ConsensusMsg, FetchReqPayload, FetchRespPayload, FetchStatus, MessageValidationError, Payload, ProposalPayload,
    SyncInfo, VotePayload,
};
pub use safety_rules::SafetyRules;
pub use smr::Smr;
pub use sync_manager::SyncManager;
pub use timer_service::{SmrPhase, TimerFired, TimerService, TimerServiceHandle};
pub use traits::{AccessControl, BlockCommitter, BlockVerifier, ConsensusBus};
