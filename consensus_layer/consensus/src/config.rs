use std::time::Duration;

use serde::Deserialize;

/// The engine's tunables (spec §6). No CLI or file-format opinion here: callers deserialize this
/// however they like, the same way chain configuration loading is out of scope for this crate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub round_timeout_base_millis: u64,
    pub round_timeout_interval_millis: u64,
    pub round_timeout_max_millis: u64,
    pub wal_dir: String,
    pub consensus_queue_capacity: usize,
    pub internal_queue_capacity: usize,
    pub block_fetch_max: usize,
}

impl Config {
    pub fn round_timeout_base(&self) -> Duration {
        Duration::from_millis(self.round_timeout_base_millis)
    }

    pub fn round_timeout_interval(&self) -> Duration {
        Duration::from_millis(self.round_timeout_interval_millis)
    }

    pub fn round_timeout_max(&self) -> Duration {
        Duration::from_millis(self.round_timeout_max_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round_timeout_base_millis: 2000,
            round_timeout_interval_millis: 1000,
            round_timeout_max_millis: 30_000,
            wal_dir: "./wal".to_string(),
            consensus_queue_capacity: 100_000,
            internal_queue_capacity: 100_000,
            block_fetch_max: 32,
        }
    }
}
