//! Ranking of competing headers at a single nonce.
//!
//! Two rules live here. The candidate reducer picks, among the records that
//! were not processed locally, the one all honest nodes converge on: a
//! notarized record beats any observed one, then the lower round wins, then
//! the lower hash. The signalling predicate then compares that candidate
//! against the locally processed record and reports a fork when the
//! candidate ranks above it, or ties with it on round and carries the higher
//! hash. The two directions are deliberately opposite.

use forkwatch_common::{BlockHeaderState, HeaderHash};

use crate::header_table::HeaderRecord;

/// Fork-choice rank of a record. Lower ranks win candidate selection.
///
/// `Notarized` orders below every `Observed` round, whatever that round is:
/// certification by a parent chain is stronger evidence than anything seen
/// locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForkRank {
    Notarized,
    Observed(u64),
}

impl ForkRank {
    pub fn of(record: &HeaderRecord) -> Self {
        match record.state {
            BlockHeaderState::Notarized => ForkRank::Notarized,
            _ => ForkRank::Observed(record.round),
        }
    }
}

/// The competing header selected at one nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkCandidate {
    pub rank: ForkRank,
    pub hash: HeaderHash,
}

/// Outcome of a fork check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForkInfo {
    pub is_detected: bool,
    /// Lowest nonce at which a fork was found. `None` when no fork was found
    /// or when the fork was forced.
    pub nonce: Option<u64>,
    /// The candidate that out-ranked the local header at `nonce`.
    pub candidate: Option<ForkCandidate>,
}

impl ForkInfo {
    /// A forced fork: the caller must resynchronise from scratch.
    pub fn forced() -> Self {
        Self {
            is_detected: true,
            nonce: None,
            candidate: None,
        }
    }

    pub fn round(&self) -> Option<ForkRank> {
        self.candidate.map(|c| c.rank)
    }

    pub fn hash(&self) -> Option<HeaderHash> {
        self.candidate.map(|c| c.hash)
    }
}

/// Fold one more record into the running candidate.
pub fn reduce_candidate(current: Option<ForkCandidate>, record: &HeaderRecord) -> ForkCandidate {
    let next = ForkCandidate {
        rank: ForkRank::of(record),
        hash: record.hash,
    };
    match current {
        None => next,
        Some(current) if next.rank < current.rank => next,
        Some(current) if next.rank == current.rank && next.hash < current.hash => next,
        Some(current) => current,
    }
}

/// True if `candidate` disagrees with the locally processed record in a way
/// that has to be reported.
pub fn should_signal_fork(local: &HeaderRecord, candidate: Option<&ForkCandidate>) -> bool {
    let Some(candidate) = candidate else {
        return false;
    };
    let local_rank = ForkRank::of(local);
    candidate.rank > local_rank || (candidate.rank == local_rank && candidate.hash > local.hash)
}
