//! Round and nonce windows used by the fork detector.

use anyhow::{bail, Result};
use config::Config;
use tracing::info;

const DEFAULT_BLOCK_FINALITY: i64 = 1;
const DEFAULT_FINAL_CHECKPOINT_DEPTH: i64 = 1;
const DEFAULT_MAX_ROUNDS_WITHOUT_RECEIVED_BLOCK: i64 = 2;
const DEFAULT_MAX_ROUNDS_WITHOUT_COMMITTED_BLOCK: i64 = 10;
const DEFAULT_NONCE_DIFFERENCE_WHEN_SYNCED: i64 = 0;
const DEFAULT_ROUND_MODULUS_TRIGGER: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ForkDetectorConfig {
    /// Rounds after which a header that was not processed locally is too old
    /// to be tracked.
    pub block_finality: i64,

    /// Number of committed blocks the final checkpoint lags behind the last
    /// checkpoint.
    pub final_checkpoint_depth: u64,

    /// Rounds without a processed block after which the probable highest
    /// nonce falls back to the last checkpoint.
    pub max_rounds_without_received_block: i64,

    /// Rounds without a committed block after which a proposing node forces
    /// a fork to get unstuck.
    pub max_rounds_without_committed_block: i64,

    /// Nonce lead over the last checkpoint above which the node is syncing.
    pub nonce_difference_when_synced: i64,

    /// Periodic checks only fire on round indexes divisible by this.
    pub round_modulus_trigger: i64,
}

impl Default for ForkDetectorConfig {
    fn default() -> Self {
        Self {
            block_finality: DEFAULT_BLOCK_FINALITY,
            final_checkpoint_depth: DEFAULT_FINAL_CHECKPOINT_DEPTH as u64,
            max_rounds_without_received_block: DEFAULT_MAX_ROUNDS_WITHOUT_RECEIVED_BLOCK,
            max_rounds_without_committed_block: DEFAULT_MAX_ROUNDS_WITHOUT_COMMITTED_BLOCK,
            nonce_difference_when_synced: DEFAULT_NONCE_DIFFERENCE_WHEN_SYNCED,
            round_modulus_trigger: DEFAULT_ROUND_MODULUS_TRIGGER,
        }
    }
}

impl ForkDetectorConfig {
    /// Read the fork detector settings, falling back to defaults for any
    /// key that is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let block_finality = config.get_int("block-finality").unwrap_or(DEFAULT_BLOCK_FINALITY);
        let final_checkpoint_depth =
            config.get_int("final-checkpoint-depth").unwrap_or(DEFAULT_FINAL_CHECKPOINT_DEPTH);
        let max_rounds_without_received_block = config
            .get_int("max-rounds-without-received-block")
            .unwrap_or(DEFAULT_MAX_ROUNDS_WITHOUT_RECEIVED_BLOCK);
        let max_rounds_without_committed_block = config
            .get_int("max-rounds-without-committed-block")
            .unwrap_or(DEFAULT_MAX_ROUNDS_WITHOUT_COMMITTED_BLOCK);
        let nonce_difference_when_synced = config
            .get_int("nonce-difference-when-synced")
            .unwrap_or(DEFAULT_NONCE_DIFFERENCE_WHEN_SYNCED);
        let round_modulus_trigger =
            config.get_int("round-modulus-trigger").unwrap_or(DEFAULT_ROUND_MODULUS_TRIGGER);

        if round_modulus_trigger <= 0 {
            bail!("round-modulus-trigger must be positive, got {round_modulus_trigger}");
        }
        if final_checkpoint_depth < 0 {
            bail!("final-checkpoint-depth must not be negative, got {final_checkpoint_depth}");
        }

        let config = Self {
            block_finality,
            final_checkpoint_depth: final_checkpoint_depth as u64,
            max_rounds_without_received_block,
            max_rounds_without_committed_block,
            nonce_difference_when_synced,
            round_modulus_trigger,
        };
        info!(
            block_finality,
            final_checkpoint_depth,
            max_rounds_without_received_block,
            max_rounds_without_committed_block,
            nonce_difference_when_synced,
            round_modulus_trigger,
            "Fork detector configured"
        );
        Ok(config)
    }

    /// True if periodic checks are allowed to fire in round `index`.
    pub fn is_in_proper_round(&self, index: i64) -> bool {
        index % self.round_modulus_trigger == 0
    }
}
