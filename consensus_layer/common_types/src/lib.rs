//   SPDX-License-Identifier: BSD-3-Clause

//! Small `Copy` value types shared by every layer of the consensus core:
//! block height, HotStuff level, epoch id and validator index. None of
//! these types touch I/O; they exist purely to stop height/level/epoch from
//! being interchangeable `u64`s at call sites.

mod committee;
mod epoch;
mod height;
mod level;
mod node_id;
mod validator_index;

pub use committee::Committee;
pub use epoch::Epoch;
pub use height::Height;
pub use level::Level;
pub use node_id::NodeId;
pub use validator_index::ValidatorIndex;
