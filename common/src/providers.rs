//! Collaborators the chain-consistency core depends on.
//!
//! Each is supplied at construction time so the embedding node can plug in
//! its real round clock, blacklist and cryptography, and tests can plug in
//! stubs.

use crate::hash::HeaderHash;
use crate::header::{ChainHeader, HeaderProof};

/// Source of the node's current round index.
pub trait RoundProvider: Send + Sync {
    fn current_round_index(&self) -> i64;
}

/// Hashes of headers whose descendants must not be proposed on top of.
pub trait BlacklistCache: Send + Sync {
    fn has(&self, hash: &HeaderHash) -> bool;
}

/// Serialisation failure while computing a header hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("header serialisation failed: {0}")]
pub struct HeaderHashingError(pub String);

/// Canonical header serialisation and hash function pair.
pub trait HeaderHasher: Send + Sync {
    fn serialize(&self, header: &ChainHeader) -> Result<Vec<u8>, HeaderHashingError>;

    fn hash(&self, bytes: &[u8]) -> HeaderHash;

    /// Hash of the canonical serialisation of `header`.
    fn header_hash(&self, header: &ChainHeader) -> Result<HeaderHash, HeaderHashingError> {
        let bytes = self.serialize(header)?;
        Ok(self.hash(&bytes))
    }
}

/// Per-epoch feature flag lookup.
pub trait EpochFlagProvider: Send + Sync {
    fn is_flag_enabled_in_epoch(&self, flag: &str, epoch: u32) -> bool;
}

/// Verifies that an aggregated proof certifies the given header.
pub trait ProofVerifier: Send + Sync {
    fn verify_proof(&self, proof: &HeaderProof, header: &ChainHeader) -> anyhow::Result<()>;
}

/// Checks the randomness seed of a header proposed by the local leader.
pub trait RandSeedVerifier: Send + Sync {
    fn is_rand_seed_valid(&self, header: &ChainHeader) -> bool;
}

/// Accepts a proposed header as long as both its seed and its predecessor's
/// seed are present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonEmptyRandSeed;

impl RandSeedVerifier for NonEmptyRandSeed {
    fn is_rand_seed_valid(&self, header: &ChainHeader) -> bool {
        !header.rand_seed().is_empty() && !header.prev_rand_seed().is_empty()
    }
}
