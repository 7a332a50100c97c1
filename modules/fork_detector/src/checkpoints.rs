//! Checkpoint history and the rest of the detector's fork state.

use forkwatch_common::HeaderHash;
use tracing::debug;

/// A `(nonce, round)` pair asserted to be on the canonical chain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    pub nonce: u64,
    pub round: u64,
    /// Header hash, unknown for the genesis checkpoint.
    pub hash: Option<HeaderHash>,
}

impl Checkpoint {
    pub fn new(nonce: u64, round: u64, hash: Option<HeaderHash>) -> Self {
        Self { nonce, round, hash }
    }

    pub fn genesis() -> Self {
        Self::default()
    }
}

/// Mutable fork state guarded by the detector's fork lock.
#[derive(Debug)]
pub struct ForkState {
    /// Sorted by ascending nonce.
    checkpoints: Vec<Checkpoint>,
    final_checkpoint: Checkpoint,
    pub probable_highest_nonce: u64,
    pub last_block_round: u64,
    pub last_proposed_block_nonce: u64,
}

impl Default for ForkState {
    fn default() -> Self {
        Self {
            checkpoints: vec![Checkpoint::genesis()],
            final_checkpoint: Checkpoint::genesis(),
            probable_highest_nonce: 0,
            last_block_round: 0,
            last_proposed_block_nonce: 0,
        }
    }
}

impl ForkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn final_checkpoint(&self) -> Checkpoint {
        self.final_checkpoint
    }

    /// Most recent checkpoint, or the final one once the history is empty.
    pub fn last_checkpoint(&self) -> Checkpoint {
        self.checkpoints.last().copied().unwrap_or(self.final_checkpoint)
    }

    /// Push the checkpoint of a newly processed header. Checkpoints at or
    /// above its nonce belong to a branch it replaces and are dropped.
    pub fn add_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.checkpoints.retain(|c| c.nonce < checkpoint.nonce);
        self.checkpoints.push(checkpoint);
    }

    /// Move the final checkpoint to the highest checkpoint lying at least
    /// `depth` nonces below the last one. Never moves backwards.
    pub fn advance_final_checkpoint(&mut self, depth: u64) {
        let last_nonce = self.last_checkpoint().nonce;
        let candidate = self
            .checkpoints
            .iter()
            .rev()
            .find(|c| c.nonce.saturating_add(depth) <= last_nonce)
            .copied();

        if let Some(candidate) = candidate {
            self.raise_final_checkpoint(candidate);
        }
    }

    /// Fold in an ancestor notarized by a parent chain: it becomes a
    /// checkpoint and, being certified, final. A local checkpoint at the same
    /// nonce is overwritten. Ignored unless it lies above the final
    /// checkpoint and not above the last one.
    pub fn add_notarized_checkpoint(&mut self, checkpoint: Checkpoint) -> bool {
        if checkpoint.nonce <= self.final_checkpoint.nonce
            || checkpoint.nonce > self.last_checkpoint().nonce
        {
            return false;
        }

        match self.checkpoints.binary_search_by_key(&checkpoint.nonce, |c| c.nonce) {
            Ok(position) => self.checkpoints[position] = checkpoint,
            Err(position) => self.checkpoints.insert(position, checkpoint),
        }
        self.raise_final_checkpoint(checkpoint);
        true
    }

    /// Promote the last checkpoint to final.
    pub fn set_final_to_last_checkpoint(&mut self) {
        let last = self.last_checkpoint();
        self.raise_final_checkpoint(last);
    }

    fn raise_final_checkpoint(&mut self, checkpoint: Checkpoint) {
        if checkpoint.nonce <= self.final_checkpoint.nonce {
            return;
        }
        debug!(
            from = self.final_checkpoint.nonce,
            to = checkpoint.nonce,
            round = checkpoint.round,
            "Final checkpoint advanced"
        );
        self.final_checkpoint = checkpoint;
    }

    /// Drop every checkpoint at exactly `nonce`.
    pub fn remove_checkpoint_with_nonce(&mut self, nonce: u64) {
        self.checkpoints.retain(|c| c.nonce != nonce);
    }

    /// Drop checkpoints below the final checkpoint.
    pub fn remove_past_checkpoints(&mut self) {
        let final_nonce = self.final_checkpoint.nonce;
        self.checkpoints.retain(|c| c.nonce >= final_nonce);
    }
}
