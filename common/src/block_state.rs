//! Provenance of an observed header.

use std::fmt;

/// Where the node learnt about a header, and therefore how far it trusts it.
///
/// The variants are declared in increasing order of authority, so the derived
/// ordering is the authority ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum BlockHeaderState {
    /// Assembled locally by this node as round leader, not yet agreed upon.
    Proposed,
    /// Received from a peer.
    Received,
    /// Certified by a parent chain or shard.
    Notarized,
    /// Executed and committed by this node.
    Processed,
}

impl BlockHeaderState {
    /// True if a record in state `self` may replace one in state `previous`
    /// for the same header hash. `Processed` is terminal.
    pub fn upgrades(self, previous: BlockHeaderState) -> bool {
        previous != BlockHeaderState::Processed && self > previous
    }

    pub fn is_processed(self) -> bool {
        matches!(self, BlockHeaderState::Processed)
    }
}

impl fmt::Display for BlockHeaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockHeaderState::Proposed => write!(f, "proposed"),
            BlockHeaderState::Received => write!(f, "received"),
            BlockHeaderState::Notarized => write!(f, "notarized"),
            BlockHeaderState::Processed => write!(f, "processed"),
        }
    }
}
