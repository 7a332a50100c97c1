//! Epoch-gated feature flags.

use std::collections::HashMap;

use config::Config;
use tracing::info;

use crate::providers::EpochFlagProvider;

/// Flag enabling the equivalent-proof check on header construction.
pub const EQUIVALENT_PROOFS_FLAG: &str = "equivalent-proofs";

const CONFIG_KEY_ENABLE_EPOCHS: &str = "enable-epochs";

/// Activation epoch per flag name; a flag is enabled from its activation
/// epoch onwards and never for flags that are not listed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EpochActivations {
    activations: HashMap<String, u32>,
}

impl EpochActivations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style activation of `flag` at `epoch`.
    pub fn with_flag(mut self, flag: &str, epoch: u32) -> Self {
        self.activations.insert(flag.to_string(), epoch);
        self
    }

    /// Read the `enable-epochs` table, e.g.
    ///
    /// ```toml
    /// [enable-epochs]
    /// equivalent-proofs = 4
    /// ```
    pub fn from_config(config: &Config) -> Self {
        let activations =
            config.get::<HashMap<String, u32>>(CONFIG_KEY_ENABLE_EPOCHS).unwrap_or_default();
        for (flag, epoch) in &activations {
            info!("Flag '{flag}' enabled from epoch {epoch}");
        }
        Self { activations }
    }

    pub fn activation_epoch(&self, flag: &str) -> Option<u32> {
        self.activations.get(flag).copied()
    }
}

impl EpochFlagProvider for EpochActivations {
    fn is_flag_enabled_in_epoch(&self, flag: &str, epoch: u32) -> bool {
        self.activation_epoch(flag).is_some_and(|activation| epoch >= activation)
    }
}
