//! Error types for header construction validation.

use forkwatch_common::{HeaderHash, RejectionKind};

/// Reasons a header is not a legal successor of its claimed predecessor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Either the current or the previous header is missing.
    #[error("nil block header")]
    NilHeader,

    /// The current header was not produced in a later round.
    #[error("round does not advance: previous {previous}, current {current}")]
    LowerOrEqualRound { previous: u64, current: u64 },

    /// The current nonce is not previous nonce + 1. `expected` is `None`
    /// when the previous nonce is already `u64::MAX`.
    #[error(
        "wrong nonce: expected {}, got {got}",
        .expected.map_or_else(|| "none".to_string(), |n| n.to_string())
    )]
    WrongNonce { expected: Option<u64>, got: u64 },

    /// The current header's previous hash is not the hash of the previous header.
    #[error("previous hash mismatch: expected {expected}, got {got}")]
    HashMismatch { expected: HeaderHash, got: HeaderHash },

    /// The randomness seed chain is broken.
    #[error("random seed mismatch: expected {expected}, got {got}")]
    RandomnessMismatch { expected: String, got: String },

    /// The proof for the previous header is missing or does not verify.
    #[error("missing or invalid proof for previous header: {0}")]
    MissingOrInvalidProof(String),

    /// The previous header could not be serialised for hashing.
    #[error("{0}")]
    Serialisation(String),
}

impl ValidationError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            ValidationError::NilHeader | ValidationError::Serialisation(_) => {
                RejectionKind::MalformedInput
            }
            ValidationError::LowerOrEqualRound { .. } | ValidationError::WrongNonce { .. } => {
                RejectionKind::TemporalOrdering
            }
            ValidationError::HashMismatch { .. }
            | ValidationError::RandomnessMismatch { .. }
            | ValidationError::MissingOrInvalidProof(_) => RejectionKind::Authenticity,
        }
    }
}
