//! Error types for fork detector operations.

use forkwatch_common::{HeaderHash, RejectionKind};

/// Reasons a header is not tracked by the
/// [`ForkDetector`](crate::ForkDetector).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForkDetectorError {
    /// No header was supplied.
    #[error("nil header")]
    NilHeader,

    /// No header hash was supplied.
    #[error("nil hash")]
    NilHash,

    /// The header round is behind the final checkpoint round, or the header
    /// is too old to matter for fork choice.
    #[error("lower round in block: round {round}, limit {limit}")]
    LowerRoundInBlock { round: u64, limit: i64 },

    /// The header nonce is not above the final checkpoint nonce.
    #[error("lower nonce in block: nonce {nonce}, final nonce {final_nonce}")]
    LowerNonceInBlock { nonce: u64, final_nonce: u64 },

    /// The header claims a round beyond the next one.
    #[error("higher round in block: round {round}, next round {next_round}")]
    HigherRoundInBlock { round: u64, next_round: i64 },

    /// The header's nonce has advanced further than its round since the
    /// final checkpoint.
    #[error("higher nonce in block: nonce distance {nonce_distance} exceeds round distance {round_distance}")]
    HigherNonceInBlock { round_distance: i64, nonce_distance: i64 },

    /// The proposed header builds on a blacklisted header.
    #[error("header is blacklisted: previous hash {prev_hash}")]
    HeaderIsBlackListed { prev_hash: HeaderHash },

    /// The proposer's random seed does not verify.
    #[error("random seed not valid")]
    RandomSeedNotValid,

    /// The header carries no signature.
    #[error("block is not signed")]
    BlockIsNotSigned,
}

impl ForkDetectorError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            ForkDetectorError::NilHeader | ForkDetectorError::NilHash => {
                RejectionKind::MalformedInput
            }
            ForkDetectorError::LowerRoundInBlock { .. }
            | ForkDetectorError::LowerNonceInBlock { .. }
            | ForkDetectorError::HigherRoundInBlock { .. }
            | ForkDetectorError::HigherNonceInBlock { .. } => RejectionKind::TemporalOrdering,
            ForkDetectorError::HeaderIsBlackListed { .. }
            | ForkDetectorError::RandomSeedNotValid
            | ForkDetectorError::BlockIsNotSigned => RejectionKind::Authenticity,
        }
    }
}
