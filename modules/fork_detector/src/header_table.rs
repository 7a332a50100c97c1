//! Per-nonce record of every header observation the detector keeps.

use std::collections::BTreeMap;

use forkwatch_common::{BlockHeaderState, HeaderHash};
use tracing::{debug, warn};

use crate::checkpoints::Checkpoint;
use crate::fork_choice::{reduce_candidate, should_signal_fork, ForkInfo};

/// One observation of a header at a given height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub nonce: u64,
    pub round: u64,
    pub hash: HeaderHash,
    pub state: BlockHeaderState,
}

impl HeaderRecord {
    /// `(round - final.round) < (nonce - final.nonce)`: the nonce has run
    /// ahead of the rounds elapsed since the final checkpoint.
    fn outruns_rounds_since(&self, checkpoint: &Checkpoint) -> bool {
        let round_distance = self.round as i64 - checkpoint.round as i64;
        let nonce_distance = self.nonce as i64 - checkpoint.nonce as i64;
        round_distance < nonce_distance
    }
}

/// Records keyed by nonce, in ascending nonce order.
///
/// Within a nonce each hash appears at most once and at most one record is
/// `Processed`.
#[derive(Debug, Default)]
pub struct HeaderTable {
    records: BTreeMap<u64, Vec<HeaderRecord>>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, nonce: u64) -> &[HeaderRecord] {
        self.records.get(&nonce).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn highest_nonce(&self) -> Option<u64> {
        self.records.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Record an observation.
    ///
    /// An already known hash only has its state upgraded, and never out of
    /// `Processed`. Whether new or upgraded, a processed hash replaces any
    /// other processed record at the same nonce.
    pub fn append(&mut self, record: HeaderRecord) {
        let records = self.records.entry(record.nonce).or_default();

        if let Some(existing) = records.iter().find(|r| r.hash == record.hash) {
            if !record.state.upgrades(existing.state) {
                return;
            }
        }

        if record.state.is_processed() {
            let before = records.len();
            records.retain(|r| !r.state.is_processed() || r.hash == record.hash);
            if records.len() != before {
                warn!(
                    nonce = record.nonce,
                    hash = %record.hash,
                    "Processed header replaces an earlier processed header at the same nonce"
                );
            }
        }

        if let Some(existing) = records.iter_mut().find(|r| r.hash == record.hash) {
            debug!(
                nonce = record.nonce,
                hash = %record.hash,
                from = %existing.state,
                to = %record.state,
                "Upgrading header state"
            );
            existing.state = record.state;
            return;
        }

        records.push(record);
    }

    /// Hash of the notarized record at `nonce`, if any.
    pub fn notarized_hash(&self, nonce: u64) -> Option<HeaderHash> {
        self.records(nonce)
            .iter()
            .find(|r| r.state == BlockHeaderState::Notarized)
            .map(|r| r.hash)
    }

    /// Drop every nonce below `nonce`.
    pub fn remove_below(&mut self, nonce: u64) {
        self.records = self.records.split_off(&nonce);
    }

    /// Drop received records whose nonce ran ahead of the rounds elapsed
    /// since `final_checkpoint`, and nonces left empty.
    pub fn remove_invalid_received(&mut self, final_checkpoint: &Checkpoint) {
        self.records.retain(|_, records| {
            records.retain(|r| {
                !(r.state == BlockHeaderState::Received && r.outruns_rounds_since(final_checkpoint))
            });
            !records.is_empty()
        });
    }

    /// Roll back `hash` at `nonce`: drop that record and every received
    /// record there, keeping the rest.
    pub fn remove_headers(&mut self, nonce: u64, hash: &HeaderHash) {
        let Some(records) = self.records.get_mut(&nonce) else {
            return;
        };
        records.retain(|r| r.hash != *hash && r.state != BlockHeaderState::Received);
        if records.is_empty() {
            self.records.remove(&nonce);
        }
    }

    /// Scan every contested nonce against the locally processed record.
    ///
    /// Reports the lowest forked nonce. Nonces found not forked are compacted
    /// down to their processed record.
    pub fn check_fork(&mut self) -> ForkInfo {
        let mut fork_info = ForkInfo::default();

        for (nonce, records) in self.records.iter_mut() {
            if records.len() < 2 {
                continue;
            }

            let mut local = None;
            let mut candidate = None;
            for record in records.iter() {
                if record.state.is_processed() {
                    local = Some(record.clone());
                    continue;
                }
                candidate = Some(reduce_candidate(candidate, record));
            }

            // Nothing processed here yet, nothing to compare against
            let Some(local) = local else {
                continue;
            };

            if should_signal_fork(&local, candidate.as_ref()) {
                if !fork_info.is_detected {
                    debug!(
                        nonce,
                        local_hash = %local.hash,
                        candidate = ?candidate,
                        "Fork detected"
                    );
                    fork_info = ForkInfo {
                        is_detected: true,
                        nonce: Some(*nonce),
                        candidate,
                    };
                }
                continue;
            }

            *records = vec![local];
        }

        fork_info
    }
}
