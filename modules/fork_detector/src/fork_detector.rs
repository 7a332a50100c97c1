//! forkwatch fork detector
//! Tracks every header seen for recent heights, keeps the finality
//! checkpoint, estimates the chain tip and reports forks of the local chain

pub mod checkpoints;
pub mod configuration;
pub mod fork_choice;
pub mod fork_error;
pub mod header_table;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use forkwatch_common::{
    BlacklistCache, BlockHeaderState, ChainHeader, HeaderHash, NonEmptyRandSeed,
    RandSeedVerifier, RoundProvider,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub use checkpoints::{Checkpoint, ForkState};
pub use configuration::ForkDetectorConfig;
pub use fork_choice::{ForkCandidate, ForkInfo, ForkRank};
pub use fork_error::ForkDetectorError;
pub use header_table::{HeaderRecord, HeaderTable};

/// An ancestor that a parent chain has notarized and that the processed
/// header being added also finalises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotarizedHeader {
    pub nonce: u64,
    pub round: u64,
    pub hash: HeaderHash,
}

impl From<(&ChainHeader, HeaderHash)> for NotarizedHeader {
    fn from((header, hash): (&ChainHeader, HeaderHash)) -> Self {
        Self {
            nonce: header.nonce(),
            round: header.round(),
            hash,
        }
    }
}

/// Fork detector for one shard or metachain process.
///
/// The header table and the fork state sit behind separate locks and no
/// operation holds both at once, so a `check_fork` scan does not stall
/// unrelated fork-state reads. Mutating entry points are additionally
/// serialised among themselves.
pub struct ForkDetector {
    config: ForkDetectorConfig,
    round_provider: Arc<dyn RoundProvider>,
    blacklist: Arc<dyn BlacklistCache>,
    rand_seed_verifier: Arc<dyn RandSeedVerifier>,

    headers: RwLock<HeaderTable>,
    fork: RwLock<ForkState>,
    should_force_fork: AtomicBool,
    mutation: Mutex<()>,
}

impl ForkDetector {
    pub fn new(
        config: ForkDetectorConfig,
        round_provider: Arc<dyn RoundProvider>,
        blacklist: Arc<dyn BlacklistCache>,
    ) -> Self {
        Self {
            config,
            round_provider,
            blacklist,
            rand_seed_verifier: Arc::new(NonEmptyRandSeed),
            headers: RwLock::new(HeaderTable::new()),
            fork: RwLock::new(ForkState::new()),
            should_force_fork: AtomicBool::new(false),
            mutation: Mutex::new(()),
        }
    }

    /// Replace the default seed check applied to proposed headers.
    pub fn with_rand_seed_verifier(mut self, verifier: Arc<dyn RandSeedVerifier>) -> Self {
        self.rand_seed_verifier = verifier;
        self
    }

    /// Track a header learnt from `state`.
    ///
    /// `notarized` lists ancestors certified by a parent chain that a
    /// processed header also finalises; it is ignored for other states.
    pub fn add_header(
        &self,
        header: Option<&ChainHeader>,
        hash: Option<&HeaderHash>,
        state: BlockHeaderState,
        notarized: &[NotarizedHeader],
    ) -> Result<(), ForkDetectorError> {
        let header = header.ok_or(ForkDetectorError::NilHeader)?;
        let hash = *hash.ok_or(ForkDetectorError::NilHash)?;

        let _mutation = self.mutation.lock();

        self.check_block_basic_validity(header, state)?;
        self.should_add_block_in_fork_detector(header, state)?;
        self.activate_forced_fork_if_needed(header, state);

        // Proposed headers are intent, not observation: they never enter
        // fork choice
        if state == BlockHeaderState::Proposed {
            self.fork.write().last_proposed_block_nonce = header.nonce();
        } else {
            self.headers.write().append(HeaderRecord {
                nonce: header.nonce(),
                round: header.round(),
                hash,
                state,
            });
        }

        if state.is_processed() {
            self.commit_checkpoint(header, hash, notarized);
        }

        self.remove_past_or_invalid_records();

        let probable_highest_nonce = self.compute_probable_highest_nonce();
        self.fork.write().probable_highest_nonce = probable_highest_nonce;

        debug!(
            nonce = header.nonce(),
            round = header.round(),
            hash = %hash,
            state = %state,
            probable_highest_nonce,
            "Header added"
        );
        Ok(())
    }

    /// Roll back the header `hash` at `nonce`: its checkpoint, its record and
    /// every received record at that nonce are dropped.
    pub fn remove_headers(&self, nonce: u64, hash: &HeaderHash) {
        let _mutation = self.mutation.lock();

        self.fork.write().remove_checkpoint_with_nonce(nonce);
        self.headers.write().remove_headers(nonce, hash);
        debug!(nonce, hash = %hash, "Headers removed");
    }

    /// Check whether the locally processed chain is forked against
    /// everything else seen.
    pub fn check_fork(&self) -> ForkInfo {
        if self.should_force_fork() {
            return ForkInfo::forced();
        }

        self.headers.write().check_fork()
    }

    pub fn probable_highest_nonce(&self) -> u64 {
        self.fork.read().probable_highest_nonce
    }

    /// Nonce of the highest block that can no longer be reverted.
    pub fn get_highest_final_block_nonce(&self) -> u64 {
        self.fork.read().final_checkpoint().nonce
    }

    pub fn get_highest_final_block_hash(&self) -> Option<HeaderHash> {
        self.fork.read().final_checkpoint().hash
    }

    /// Fall back to the last checkpoint if no block was processed for too
    /// many rounds; meant to be called on a timer.
    pub fn reset_probable_highest_nonce_if_needed(&self) {
        let _mutation = self.mutation.lock();

        let round_index = self.round_provider.current_round_index();
        let rounds_without_received_block =
            round_index - self.fork.read().last_block_round as i64;
        if rounds_without_received_block > self.config.max_rounds_without_received_block
            && self.config.is_in_proper_round(round_index)
        {
            self.reset_probable_highest_nonce_locked();
        }
    }

    /// Set the probable highest nonce and the last proposed nonce back to
    /// the last checkpoint.
    pub fn reset_probable_highest_nonce(&self) {
        let _mutation = self.mutation.lock();
        self.reset_probable_highest_nonce_locked();
    }

    /// Clear the forced fork once the caller has resynchronised.
    pub fn reset_fork(&self) {
        self.should_force_fork.store(false, Ordering::SeqCst);
    }

    pub fn should_force_fork(&self) -> bool {
        self.should_force_fork.load(Ordering::SeqCst)
    }

    /// Forget everything and start again from genesis.
    pub fn restore_to_genesis(&self) {
        let _mutation = self.mutation.lock();

        self.headers.write().clear();
        *self.fork.write() = ForkState::new();
        self.should_force_fork.store(false, Ordering::SeqCst);
        info!("Fork detector restored to genesis");
    }

    /// Treat the last checkpoint as final, e.g. after loading the chain from
    /// storage.
    pub fn set_final_to_last_checkpoint(&self) {
        let _mutation = self.mutation.lock();

        self.fork.write().set_final_to_last_checkpoint();
        self.remove_past_or_invalid_records();
    }

    /// Snapshot of the records tracked at `nonce`.
    pub fn headers(&self, nonce: u64) -> Vec<HeaderRecord> {
        self.headers.read().records(nonce).to_vec()
    }

    pub fn get_notarized_header_hash(&self, nonce: u64) -> Option<HeaderHash> {
        self.headers.read().notarized_hash(nonce)
    }

    pub fn last_checkpoint(&self) -> Checkpoint {
        self.fork.read().last_checkpoint()
    }

    pub fn final_checkpoint(&self) -> Checkpoint {
        self.fork.read().final_checkpoint()
    }

    pub fn last_block_round(&self) -> u64 {
        self.fork.read().last_block_round
    }

    pub fn last_proposed_block_nonce(&self) -> u64 {
        self.fork.read().last_proposed_block_nonce
    }

    fn check_block_basic_validity(
        &self,
        header: &ChainHeader,
        state: BlockHeaderState,
    ) -> Result<(), ForkDetectorError> {
        let final_checkpoint = self.final_checkpoint();
        let round_distance = header.round() as i64 - final_checkpoint.round as i64;
        let nonce_distance = header.nonce() as i64 - final_checkpoint.nonce as i64;
        let next_round = self.round_provider.current_round_index() + 1;

        if round_distance < 0 {
            return Err(ForkDetectorError::LowerRoundInBlock {
                round: header.round(),
                limit: final_checkpoint.round as i64,
            });
        }
        if nonce_distance <= 0 {
            return Err(ForkDetectorError::LowerNonceInBlock {
                nonce: header.nonce(),
                final_nonce: final_checkpoint.nonce,
            });
        }
        if header.round() as i64 > next_round {
            return Err(ForkDetectorError::HigherRoundInBlock {
                round: header.round(),
                next_round,
            });
        }
        if round_distance < nonce_distance {
            return Err(ForkDetectorError::HigherNonceInBlock {
                round_distance,
                nonce_distance,
            });
        }

        match state {
            BlockHeaderState::Proposed => {
                if self.blacklist.has(header.prev_hash()) {
                    return Err(ForkDetectorError::HeaderIsBlackListed {
                        prev_hash: *header.prev_hash(),
                    });
                }
                if !self.rand_seed_verifier.is_rand_seed_valid(header) {
                    return Err(ForkDetectorError::RandomSeedNotValid);
                }
            }
            BlockHeaderState::Received | BlockHeaderState::Processed => {
                if !header.is_signed() {
                    return Err(ForkDetectorError::BlockIsNotSigned);
                }
            }
            BlockHeaderState::Notarized => {}
        }

        Ok(())
    }

    /// Reject headers not processed locally that are already too old to
    /// matter for fork choice.
    fn should_add_block_in_fork_detector(
        &self,
        header: &ChainHeader,
        state: BlockHeaderState,
    ) -> Result<(), ForkDetectorError> {
        if state.is_processed() {
            return Ok(());
        }

        let limit = self.round_provider.current_round_index() - self.config.block_finality;
        if (header.round() as i64) < limit {
            return Err(ForkDetectorError::LowerRoundInBlock {
                round: header.round(),
                limit,
            });
        }

        Ok(())
    }

    /// A node ready to propose the block right after its last checkpoint,
    /// but unable to commit anything for too long, declares a fork to get
    /// unstuck.
    fn activate_forced_fork_if_needed(&self, header: &ChainHeader, state: BlockHeaderState) {
        if state != BlockHeaderState::Proposed || self.is_syncing() {
            return;
        }

        let last_checkpoint = self.last_checkpoint();
        let rounds_difference = header.round() as i64 - last_checkpoint.round as i64;
        let nonces_difference = header.nonce() as i64 - last_checkpoint.nonce as i64;
        let round_index = self.round_provider.current_round_index();

        let should_force_fork = rounds_difference
            > self.config.max_rounds_without_committed_block
            && nonces_difference <= 1
            && self.config.is_in_proper_round(round_index);
        if !should_force_fork {
            return;
        }

        warn!(
            nonce = header.nonce(),
            round = header.round(),
            last_checkpoint_nonce = last_checkpoint.nonce,
            last_checkpoint_round = last_checkpoint.round,
            "No block committed for too long, forcing fork"
        );
        self.should_force_fork.store(true, Ordering::SeqCst);
    }

    fn is_syncing(&self) -> bool {
        let fork = self.fork.read();
        let nonces_difference =
            fork.probable_highest_nonce as i64 - fork.last_checkpoint().nonce as i64;
        nonces_difference > self.config.nonce_difference_when_synced
    }

    /// Checkpoint a processed header, together with the notarized ancestors
    /// it finalises.
    fn commit_checkpoint(
        &self,
        header: &ChainHeader,
        hash: HeaderHash,
        notarized: &[NotarizedHeader],
    ) {
        let final_nonce = self.get_highest_final_block_nonce();
        let ancestors: Vec<&NotarizedHeader> = notarized
            .iter()
            .filter(|n| n.nonce > final_nonce && n.nonce < header.nonce())
            .collect();

        // Table first, fork state after: the two locks are never held together
        if !ancestors.is_empty() {
            let mut headers = self.headers.write();
            for ancestor in &ancestors {
                headers.append(HeaderRecord {
                    nonce: ancestor.nonce,
                    round: ancestor.round,
                    hash: ancestor.hash,
                    state: BlockHeaderState::Notarized,
                });
            }
        }

        let mut fork = self.fork.write();
        fork.last_block_round = header.round();
        fork.add_checkpoint(Checkpoint::new(header.nonce(), header.round(), Some(hash)));
        fork.advance_final_checkpoint(self.config.final_checkpoint_depth);
        for ancestor in ancestors {
            fork.add_notarized_checkpoint(Checkpoint::new(
                ancestor.nonce,
                ancestor.round,
                Some(ancestor.hash),
            ));
        }
    }

    fn remove_past_or_invalid_records(&self) {
        let final_checkpoint = self.final_checkpoint();

        {
            let mut headers = self.headers.write();
            headers.remove_below(final_checkpoint.nonce);
            headers.remove_invalid_received(&final_checkpoint);
        }

        self.fork.write().remove_past_checkpoints();
    }

    fn compute_probable_highest_nonce(&self) -> u64 {
        let (final_nonce, last_proposed_block_nonce) = {
            let fork = self.fork.read();
            (fork.final_checkpoint().nonce, fork.last_proposed_block_nonce)
        };

        let mut probable_highest_nonce = final_nonce;
        if last_proposed_block_nonce > 0 {
            probable_highest_nonce = probable_highest_nonce.max(last_proposed_block_nonce - 1);
        }

        match self.headers.read().highest_nonce() {
            Some(highest) => probable_highest_nonce.max(highest),
            None => probable_highest_nonce,
        }
    }

    fn reset_probable_highest_nonce_locked(&self) {
        let mut fork = self.fork.write();
        let nonce = fork.last_checkpoint().nonce;
        fork.probable_highest_nonce = nonce;
        fork.last_proposed_block_nonce = nonce;
        info!(nonce, "Probable highest nonce reset to last checkpoint");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forkwatch_test_utils::{
        hash, hash_from_label, shard_header, shard_header_on, unsigned_shard_header,
        BlacklistStub, RoundHandlerMock,
    };

    use BlockHeaderState::*;

    fn make_detector(round_index: i64) -> (ForkDetector, Arc<RoundHandlerMock>) {
        make_detector_with(round_index, ForkDetectorConfig::default())
    }

    fn make_detector_with(
        round_index: i64,
        config: ForkDetectorConfig,
    ) -> (ForkDetector, Arc<RoundHandlerMock>) {
        let rounds = Arc::new(RoundHandlerMock::new(round_index));
        let detector = ForkDetector::new(config, rounds.clone(), Arc::new(BlacklistStub::default()));
        (detector, rounds)
    }

    #[test]
    fn new_detector_starts_at_genesis() {
        let (detector, _) = make_detector(0);
        assert_eq!(detector.last_checkpoint(), Checkpoint::genesis());
        assert_eq!(detector.final_checkpoint(), Checkpoint::genesis());
        assert_eq!(detector.probable_highest_nonce(), 0);
        assert!(!detector.should_force_fork());
    }

    #[test]
    fn nil_header_is_rejected() {
        let (detector, _) = make_detector(100);
        assert_eq!(
            detector.add_header(None, Some(&hash(1)), Processed, &[]),
            Err(ForkDetectorError::NilHeader)
        );
    }

    #[test]
    fn nil_hash_is_rejected() {
        let (detector, _) = make_detector(100);
        let header = shard_header(1, 1);
        assert_eq!(
            detector.add_header(Some(&header), None, Processed, &[]),
            Err(ForkDetectorError::NilHash)
        );
    }

    #[test]
    fn nonce_not_above_final_is_rejected() {
        let (detector, _) = make_detector(10);
        let header = shard_header(0, 3);
        assert!(matches!(
            detector.add_header(Some(&header), Some(&hash(1)), Received, &[]),
            Err(ForkDetectorError::LowerNonceInBlock { .. })
        ));
    }

    #[test]
    fn round_behind_final_is_rejected() {
        let config = ForkDetectorConfig {
            final_checkpoint_depth: 0,
            ..ForkDetectorConfig::default()
        };
        let (detector, _) = make_detector_with(10, config);
        detector.add_header(Some(&shard_header(3, 8)), Some(&hash(1)), Processed, &[]).unwrap();
        assert_eq!(detector.get_highest_final_block_nonce(), 3);

        assert!(matches!(
            detector.add_header(Some(&shard_header(4, 7)), Some(&hash(2)), Processed, &[]),
            Err(ForkDetectorError::LowerRoundInBlock { .. })
        ));
    }

    #[test]
    fn round_from_the_future_is_rejected() {
        let (detector, _) = make_detector(10);
        assert!(matches!(
            detector.add_header(Some(&shard_header(1, 12)), Some(&hash(1)), Received, &[]),
            Err(ForkDetectorError::HigherRoundInBlock { round: 12, next_round: 11 })
        ));
        // next round is still acceptable
        assert_eq!(
            detector.add_header(Some(&shard_header(1, 11)), Some(&hash(1)), Received, &[]),
            Ok(())
        );
    }

    #[test]
    fn nonce_running_ahead_of_rounds_is_rejected() {
        let (detector, _) = make_detector(100);
        let err = detector
            .add_header(Some(&shard_header(1, 0)), Some(&hash_from_label("hash1")), Processed, &[])
            .unwrap_err();
        assert_eq!(
            err,
            ForkDetectorError::HigherNonceInBlock {
                round_distance: 0,
                nonce_distance: 1
            }
        );
        assert_eq!(err.kind(), forkwatch_common::RejectionKind::TemporalOrdering);
    }

    #[test]
    fn unsigned_received_or_processed_is_rejected() {
        let (detector, _) = make_detector(5);
        let header = unsigned_shard_header(1, 5);
        for state in [Received, Processed] {
            assert_eq!(
                detector.add_header(Some(&header), Some(&hash(1)), state, &[]),
                Err(ForkDetectorError::BlockIsNotSigned)
            );
        }
        // notarized headers are certified elsewhere
        assert_eq!(detector.add_header(Some(&header), Some(&hash(1)), Notarized, &[]), Ok(()));
    }

    #[test]
    fn proposed_on_blacklisted_parent_is_rejected() {
        let rounds = Arc::new(RoundHandlerMock::new(5));
        let blacklist = Arc::new(BlacklistStub::default());
        blacklist.add(hash(66));
        let detector = ForkDetector::new(ForkDetectorConfig::default(), rounds, blacklist);

        let header = shard_header_on(1, 5, hash(66));
        assert_eq!(
            detector.add_header(Some(&header), Some(&hash(1)), Proposed, &[]),
            Err(ForkDetectorError::HeaderIsBlackListed { prev_hash: hash(66) })
        );
    }

    #[test]
    fn proposed_without_seed_is_rejected() {
        let (detector, _) = make_detector(5);
        let mut header = shard_header(1, 5);
        if let ChainHeader::Shard(shard) = &mut header {
            shard.core.rand_seed.clear();
        }
        let err = detector.add_header(Some(&header), Some(&hash(1)), Proposed, &[]).unwrap_err();
        assert_eq!(err, ForkDetectorError::RandomSeedNotValid);
        assert!(err.kind().is_peer_fault());
    }

    #[test]
    fn stale_received_header_is_rejected_but_processed_is_not() {
        let (detector, _) = make_detector(20);
        let header = shard_header(1, 10);
        assert_eq!(
            detector.add_header(Some(&header), Some(&hash(1)), Received, &[]),
            Err(ForkDetectorError::LowerRoundInBlock { round: 10, limit: 19 })
        );
        assert_eq!(detector.add_header(Some(&header), Some(&hash(1)), Processed, &[]), Ok(()));
    }

    #[test]
    fn proposed_header_only_moves_last_proposed_nonce() {
        let (detector, _) = make_detector(5);
        detector.add_header(Some(&shard_header(4, 5)), Some(&hash(1)), Proposed, &[]).unwrap();
        assert!(detector.headers(4).is_empty());
        assert_eq!(detector.last_proposed_block_nonce(), 4);
        assert_eq!(detector.probable_highest_nonce(), 3);
    }

    #[test]
    fn processed_header_sets_checkpoint_and_round() {
        let (detector, _) = make_detector(73);
        detector.add_header(Some(&shard_header(69, 72)), Some(&hash(1)), Processed, &[]).unwrap();
        assert_eq!(detector.last_checkpoint(), Checkpoint::new(69, 72, Some(hash(1))));
        assert_eq!(detector.last_block_round(), 72);
        assert_eq!(detector.probable_highest_nonce(), 69);
    }

    #[test]
    fn notarized_ancestors_advance_finality() {
        let (detector, _) = make_detector(20);
        for nonce in 1..=3 {
            detector
                .add_header(Some(&shard_header(nonce, nonce)), Some(&hash(nonce as u8)), Processed, &[])
                .unwrap();
        }
        assert_eq!(detector.get_highest_final_block_nonce(), 2);

        let ancestor = NotarizedHeader {
            nonce: 3,
            round: 3,
            hash: hash(3),
        };
        detector
            .add_header(Some(&shard_header(4, 4)), Some(&hash(4)), Processed, &[ancestor])
            .unwrap();
        assert_eq!(detector.get_highest_final_block_nonce(), 3);
        assert_eq!(detector.get_highest_final_block_hash(), Some(hash(3)));
    }

    #[test]
    fn notarized_ancestor_with_new_hash_is_recorded() {
        let (detector, _) = make_detector(20);
        detector.add_header(Some(&shard_header(2, 2)), Some(&hash(2)), Processed, &[]).unwrap();

        let ancestor = NotarizedHeader::from((&shard_header(3, 3), hash(30)));
        detector
            .add_header(Some(&shard_header(4, 4)), Some(&hash(4)), Processed, &[ancestor])
            .unwrap();
        assert_eq!(detector.get_notarized_header_hash(3), Some(hash(30)));
    }

    #[test]
    fn notarized_list_is_ignored_for_non_processed_states() {
        let (detector, _) = make_detector(20);
        let ancestor = NotarizedHeader {
            nonce: 1,
            round: 1,
            hash: hash(1),
        };
        detector
            .add_header(Some(&shard_header(2, 19)), Some(&hash(2)), Received, &[ancestor])
            .unwrap();
        assert!(detector.headers(1).is_empty());
        assert_eq!(detector.get_highest_final_block_nonce(), 0);
    }

    #[test]
    fn remove_headers_drops_checkpoint_and_records() {
        let (detector, _) = make_detector(20);
        detector.add_header(Some(&shard_header(1, 1)), Some(&hash(1)), Processed, &[]).unwrap();
        detector.add_header(Some(&shard_header(2, 2)), Some(&hash(2)), Processed, &[]).unwrap();
        detector.add_header(Some(&shard_header(2, 19)), Some(&hash(3)), Received, &[]).unwrap();

        detector.remove_headers(2, &hash(2));
        assert!(detector.headers(2).is_empty());
        assert_eq!(detector.last_checkpoint().nonce, 1);
    }

    #[test]
    fn forced_fork_fires_when_stuck_in_proper_round() {
        let (detector, _) = make_detector(15);
        detector.add_header(Some(&shard_header(1, 15)), Some(&hash(1)), Proposed, &[]).unwrap();
        assert!(detector.should_force_fork());

        let info = detector.check_fork();
        assert_eq!(info, ForkInfo::forced());

        detector.reset_fork();
        assert!(!detector.check_fork().is_detected);
    }

    #[test]
    fn forced_fork_needs_proper_round() {
        let (detector, _) = make_detector(16);
        detector.add_header(Some(&shard_header(1, 16)), Some(&hash(1)), Proposed, &[]).unwrap();
        assert!(!detector.should_force_fork());
    }

    #[test]
    fn forced_fork_needs_enough_rounds_without_commit() {
        let (detector, _) = make_detector(10);
        detector.add_header(Some(&shard_header(1, 10)), Some(&hash(1)), Proposed, &[]).unwrap();
        assert!(!detector.should_force_fork());
    }

    #[test]
    fn forced_fork_skipped_while_syncing() {
        let (detector, rounds) = make_detector(9);
        // a peer shows we are far behind
        detector.add_header(Some(&shard_header(5, 9)), Some(&hash(5)), Received, &[]).unwrap();
        assert_eq!(detector.probable_highest_nonce(), 5);

        rounds.set_index(15);
        detector.add_header(Some(&shard_header(1, 15)), Some(&hash(1)), Proposed, &[]).unwrap();
        assert!(!detector.should_force_fork());
    }

    #[test]
    fn probable_nonce_reset_after_silence_in_proper_round() {
        let (detector, rounds) = make_detector(3);
        detector.add_header(Some(&shard_header(1, 2)), Some(&hash(1)), Processed, &[]).unwrap();
        detector.add_header(Some(&shard_header(2, 3)), Some(&hash(2)), Received, &[]).unwrap();
        assert_eq!(detector.probable_highest_nonce(), 2);

        // not enough silent rounds yet
        rounds.set_index(4);
        detector.reset_probable_highest_nonce_if_needed();
        assert_eq!(detector.probable_highest_nonce(), 2);

        // enough rounds, but not a proper round
        rounds.set_index(6);
        detector.reset_probable_highest_nonce_if_needed();
        assert_eq!(detector.probable_highest_nonce(), 2);

        rounds.set_index(10);
        detector.reset_probable_highest_nonce_if_needed();
        assert_eq!(detector.probable_highest_nonce(), 1);
        assert_eq!(detector.last_proposed_block_nonce(), 1);
    }

    #[test]
    fn restore_to_genesis_clears_everything() {
        let (detector, _) = make_detector(15);
        detector.add_header(Some(&shard_header(1, 1)), Some(&hash(1)), Processed, &[]).unwrap();
        detector.add_header(Some(&shard_header(2, 2)), Some(&hash(2)), Processed, &[]).unwrap();
        detector.add_header(Some(&shard_header(3, 15)), Some(&hash(3)), Proposed, &[]).unwrap();

        detector.restore_to_genesis();
        assert_eq!(detector.final_checkpoint(), Checkpoint::genesis());
        assert_eq!(detector.last_checkpoint(), Checkpoint::genesis());
        assert!(detector.headers(1).is_empty());
        assert!(detector.headers(2).is_empty());
        assert_eq!(detector.probable_highest_nonce(), 0);
        assert_eq!(detector.last_proposed_block_nonce(), 0);
        assert!(!detector.should_force_fork());
    }

    #[test]
    fn set_final_to_last_checkpoint_prunes_below() {
        let (detector, _) = make_detector(20);
        for nonce in 1..=3 {
            detector
                .add_header(Some(&shard_header(nonce, nonce)), Some(&hash(nonce as u8)), Processed, &[])
                .unwrap();
        }
        detector.set_final_to_last_checkpoint();
        assert_eq!(detector.get_highest_final_block_nonce(), 3);
        assert!(detector.headers(2).is_empty());
        assert_eq!(detector.headers(3).len(), 1);
    }
}
