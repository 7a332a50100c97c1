//! forkwatch header construction validator
//! Decides whether a header is a legitimate direct child of another

pub mod proof_verifier;
pub mod validation_error;

use std::sync::Arc;

use forkwatch_common::{
    ChainHeader, EpochFlagProvider, HeaderHasher, HeaderProof, ProofVerifier,
    EQUIVALENT_PROOFS_FLAG,
};
use tracing::trace;

pub use proof_verifier::HeaderBoundProofVerifier;
pub use validation_error::ValidationError;

/// Stateless validator of header-to-header continuity.
///
/// Holds only its collaborators, so a single instance can be shared between
/// threads and called concurrently without locking.
#[derive(Clone)]
pub struct HeaderValidator {
    hasher: Arc<dyn HeaderHasher>,
    epoch_flags: Arc<dyn EpochFlagProvider>,
    proof_verifier: Arc<dyn ProofVerifier>,
}

impl HeaderValidator {
    pub fn new(
        hasher: Arc<dyn HeaderHasher>,
        epoch_flags: Arc<dyn EpochFlagProvider>,
        proof_verifier: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            hasher,
            epoch_flags,
            proof_verifier,
        }
    }

    /// Check that `current` is built directly on top of `previous`.
    ///
    /// Checks run in a fixed order and the first violation is returned:
    /// round, nonce, previous hash, random seed, then (when the equivalent
    /// proofs flag is active for `previous`'s epoch) the proof for `previous`
    /// carried by `current`.
    pub fn is_header_construction_valid(
        &self,
        current: Option<&ChainHeader>,
        previous: Option<&ChainHeader>,
    ) -> Result<(), ValidationError> {
        let Some(previous) = previous else {
            return Err(ValidationError::NilHeader);
        };
        let Some(current) = current else {
            return Err(ValidationError::NilHeader);
        };

        if previous.round() >= current.round() {
            trace!(
                shard = current.shard_id(),
                local_round = previous.round(),
                received_round = current.round(),
                "round does not match"
            );
            return Err(ValidationError::LowerOrEqualRound {
                previous: previous.round(),
                current: current.round(),
            });
        }

        let expected_nonce = previous.nonce().checked_add(1);
        if expected_nonce != Some(current.nonce()) {
            trace!(
                shard = current.shard_id(),
                local_nonce = previous.nonce(),
                received_nonce = current.nonce(),
                "nonce does not match"
            );
            return Err(ValidationError::WrongNonce {
                expected: expected_nonce,
                got: current.nonce(),
            });
        }

        let previous_hash = self
            .hasher
            .header_hash(previous)
            .map_err(|e| ValidationError::Serialisation(e.to_string()))?;
        if *current.prev_hash() != previous_hash {
            trace!(
                shard = current.shard_id(),
                local_hash = %previous_hash,
                received_prev_hash = %current.prev_hash(),
                "header hash does not match"
            );
            return Err(ValidationError::HashMismatch {
                expected: previous_hash,
                got: *current.prev_hash(),
            });
        }

        if current.prev_rand_seed() != previous.rand_seed() {
            trace!(
                shard = current.shard_id(),
                local_rand_seed = hex::encode(previous.rand_seed()),
                received_prev_rand_seed = hex::encode(current.prev_rand_seed()),
                "header random seed does not match"
            );
            return Err(ValidationError::RandomnessMismatch {
                expected: hex::encode(previous.rand_seed()),
                got: hex::encode(current.prev_rand_seed()),
            });
        }

        self.verify_proof_for_header(previous, current.previous_proof())
    }

    fn verify_proof_for_header(
        &self,
        header: &ChainHeader,
        proof: Option<&HeaderProof>,
    ) -> Result<(), ValidationError> {
        if !self.epoch_flags.is_flag_enabled_in_epoch(EQUIVALENT_PROOFS_FLAG, header.epoch()) {
            return Ok(());
        }

        let Some(proof) = proof else {
            trace!(nonce = header.nonce(), "missing proof for previous header");
            return Err(ValidationError::MissingOrInvalidProof(
                "no proof attached".to_string(),
            ));
        };

        self.proof_verifier.verify_proof(proof, header).map_err(|e| {
            trace!(nonce = header.nonce(), "invalid proof for previous header: {e}");
            ValidationError::MissingOrInvalidProof(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forkwatch_common::{Blake2bHeaderHasher, EpochActivations, HeaderCore, ShardHeader};
    use forkwatch_test_utils::{FailingProofVerifier, ProofVerifierStub};

    fn validator_with(flags: EpochActivations, verifier: Arc<dyn ProofVerifier>) -> HeaderValidator {
        HeaderValidator::new(Arc::new(Blake2bHeaderHasher), Arc::new(flags), verifier)
    }

    fn validator() -> HeaderValidator {
        validator_with(EpochActivations::new(), Arc::new(ProofVerifierStub::default()))
    }

    fn previous() -> ChainHeader {
        ChainHeader::from(ShardHeader {
            shard_id: 0,
            core: HeaderCore {
                nonce: 5,
                round: 7,
                rand_seed: b"seed-5".to_vec(),
                pub_keys_bitmap: vec![1],
                ..HeaderCore::default()
            },
        })
    }

    fn child_of(previous: &ChainHeader) -> ChainHeader {
        let prev_hash = Blake2bHeaderHasher.header_hash(previous).unwrap();
        ChainHeader::from(ShardHeader {
            shard_id: 0,
            core: HeaderCore {
                nonce: previous.nonce() + 1,
                round: previous.round() + 1,
                prev_hash,
                prev_rand_seed: previous.rand_seed().to_vec(),
                rand_seed: b"seed-6".to_vec(),
                pub_keys_bitmap: vec![1],
                ..HeaderCore::default()
            },
        })
    }

    fn with_core(header: &ChainHeader, f: impl FnOnce(&mut HeaderCore)) -> ChainHeader {
        let mut header = header.clone();
        match &mut header {
            ChainHeader::Shard(h) => f(&mut h.core),
            ChainHeader::Meta(h) => f(&mut h.core),
        }
        header
    }

    #[test]
    fn nil_previous_is_rejected() {
        let current = child_of(&previous());
        assert_eq!(
            validator().is_header_construction_valid(Some(&current), None),
            Err(ValidationError::NilHeader)
        );
    }

    #[test]
    fn nil_current_is_rejected() {
        assert_eq!(
            validator().is_header_construction_valid(None, Some(&previous())),
            Err(ValidationError::NilHeader)
        );
    }

    #[test]
    fn valid_child_is_accepted() {
        let prev = previous();
        let current = child_of(&prev);
        assert_eq!(validator().is_header_construction_valid(Some(&current), Some(&prev)), Ok(()));
    }

    #[test]
    fn equal_round_is_rejected_before_anything_else() {
        let prev = previous();
        // Everything else is also wrong; the round check must win.
        let current = with_core(&child_of(&prev), |c| {
            c.round = prev.round();
            c.nonce = 42;
            c.prev_rand_seed = b"garbage".to_vec();
        });
        assert_eq!(
            validator().is_header_construction_valid(Some(&current), Some(&prev)),
            Err(ValidationError::LowerOrEqualRound {
                previous: 7,
                current: 7
            })
        );
    }

    #[test]
    fn lower_round_is_rejected() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.round = 3);
        assert!(matches!(
            validator().is_header_construction_valid(Some(&current), Some(&prev)),
            Err(ValidationError::LowerOrEqualRound { .. })
        ));
    }

    #[test]
    fn skipped_nonce_is_rejected() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.nonce = 7);
        assert_eq!(
            validator().is_header_construction_valid(Some(&current), Some(&prev)),
            Err(ValidationError::WrongNonce {
                expected: Some(6),
                got: 7
            })
        );
    }

    #[test]
    fn no_successor_after_last_nonce() {
        let prev = with_core(&previous(), |c| c.nonce = u64::MAX);
        let prev_hash = Blake2bHeaderHasher.header_hash(&prev).unwrap();
        let current = with_core(&child_of(&previous()), |c| {
            c.nonce = u64::MAX;
            c.prev_hash = prev_hash;
        });
        let err = validator().is_header_construction_valid(Some(&current), Some(&prev)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongNonce {
                expected: None,
                got: u64::MAX
            }
        );
        assert_eq!(err.to_string(), format!("wrong nonce: expected none, got {}", u64::MAX));
    }

    #[test]
    fn wrong_prev_hash_is_rejected() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.prev_hash = [9u8; 32].into());
        let err = validator().is_header_construction_valid(Some(&current), Some(&prev)).unwrap_err();
        assert!(matches!(err, ValidationError::HashMismatch { .. }));
        assert_eq!(err.kind(), forkwatch_common::RejectionKind::Authenticity);
    }

    #[test]
    fn broken_seed_chain_is_rejected() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.prev_rand_seed = b"other".to_vec());
        assert!(matches!(
            validator().is_header_construction_valid(Some(&current), Some(&prev)),
            Err(ValidationError::RandomnessMismatch { .. })
        ));
    }

    #[test]
    fn proof_is_ignored_while_flag_inactive() {
        let prev = previous();
        let current = child_of(&prev);
        let validator = validator_with(
            EpochActivations::new().with_flag(EQUIVALENT_PROOFS_FLAG, 1),
            Arc::new(FailingProofVerifier),
        );
        assert_eq!(validator.is_header_construction_valid(Some(&current), Some(&prev)), Ok(()));
    }

    #[test]
    fn missing_proof_is_rejected_once_flag_active() {
        let prev = previous();
        let current = child_of(&prev);
        let validator = validator_with(
            EpochActivations::new().with_flag(EQUIVALENT_PROOFS_FLAG, 0),
            Arc::new(ProofVerifierStub::default()),
        );
        assert!(matches!(
            validator.is_header_construction_valid(Some(&current), Some(&prev)),
            Err(ValidationError::MissingOrInvalidProof(_))
        ));
    }

    #[test]
    fn rejected_proof_is_reported() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.previous_proof = Some(HeaderProof::default()));
        let validator = validator_with(
            EpochActivations::new().with_flag(EQUIVALENT_PROOFS_FLAG, 0),
            Arc::new(FailingProofVerifier),
        );
        assert!(matches!(
            validator.is_header_construction_valid(Some(&current), Some(&prev)),
            Err(ValidationError::MissingOrInvalidProof(_))
        ));
    }

    #[test]
    fn accepted_proof_passes() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.previous_proof = Some(HeaderProof::default()));
        let stub = Arc::new(ProofVerifierStub::default());
        let validator = validator_with(
            EpochActivations::new().with_flag(EQUIVALENT_PROOFS_FLAG, 0),
            stub.clone(),
        );
        assert_eq!(validator.is_header_construction_valid(Some(&current), Some(&prev)), Ok(()));
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn validation_is_repeatable() {
        let prev = previous();
        let current = with_core(&child_of(&prev), |c| c.nonce = 9);
        let validator = validator();
        let first = validator.is_header_construction_valid(Some(&current), Some(&prev));
        let second = validator.is_header_construction_valid(Some(&current), Some(&prev));
        assert_eq!(first, second);
    }
}
