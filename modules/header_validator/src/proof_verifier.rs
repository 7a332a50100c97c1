//! Default proof verifier: checks that a proof is bound to the header it claims.

use std::sync::Arc;

use anyhow::{bail, Result};
use forkwatch_common::{ChainHeader, HeaderHasher, HeaderProof, ProofVerifier};

/// Checks that a proof names exactly the given header and is signed.
///
/// Signature aggregation itself is verified by the consensus layer before
/// the proof is attached, so this only checks the binding between the proof
/// and the header.
pub struct HeaderBoundProofVerifier {
    hasher: Arc<dyn HeaderHasher>,
}

impl HeaderBoundProofVerifier {
    pub fn new(hasher: Arc<dyn HeaderHasher>) -> Self {
        Self { hasher }
    }
}

impl ProofVerifier for HeaderBoundProofVerifier {
    fn verify_proof(&self, proof: &HeaderProof, header: &ChainHeader) -> Result<()> {
        let header_hash = self.hasher.header_hash(header)?;
        if proof.header_hash != header_hash {
            bail!("proof is for header {}, expected {header_hash}", proof.header_hash);
        }
        if proof.header_epoch != header.epoch() {
            bail!("proof epoch {} does not match header epoch {}", proof.header_epoch, header.epoch());
        }
        if proof.header_nonce != header.nonce() {
            bail!("proof nonce {} does not match header nonce {}", proof.header_nonce, header.nonce());
        }
        if proof.header_round != header.round() {
            bail!("proof round {} does not match header round {}", proof.header_round, header.round());
        }
        if proof.header_shard_id != header.shard_id() {
            bail!(
                "proof shard {} does not match header shard {}",
                proof.header_shard_id,
                header.shard_id()
            );
        }
        if proof.aggregated_signature.is_empty() {
            bail!("proof has no aggregated signature");
        }
        if proof.pub_keys_bitmap.iter().all(|b| *b == 0) {
            bail!("proof has no signers");
        }
        Ok(())
    }
}
