//! Mocks and header builders shared by the forkwatch module tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use anyhow::{bail, Result};
use forkwatch_common::{
    BlacklistCache, ChainHeader, HeaderCore, HeaderHash, HeaderProof, ProofVerifier,
    RoundProvider, ShardHeader,
};
use parking_lot::Mutex;

/// Round provider whose index the test moves by hand.
#[derive(Debug, Default)]
pub struct RoundHandlerMock {
    index: AtomicI64,
}

impl RoundHandlerMock {
    pub fn new(index: i64) -> Self {
        Self {
            index: AtomicI64::new(index),
        }
    }

    pub fn set_index(&self, index: i64) {
        self.index.store(index, Ordering::SeqCst);
    }
}

impl RoundProvider for RoundHandlerMock {
    fn current_round_index(&self) -> i64 {
        self.index.load(Ordering::SeqCst)
    }
}

/// In-memory blacklist.
#[derive(Debug, Default)]
pub struct BlacklistStub {
    hashes: Mutex<HashSet<HeaderHash>>,
}

impl BlacklistStub {
    pub fn add(&self, hash: HeaderHash) {
        self.hashes.lock().insert(hash);
    }
}

impl BlacklistCache for BlacklistStub {
    fn has(&self, hash: &HeaderHash) -> bool {
        self.hashes.lock().contains(hash)
    }
}

/// Proof verifier that accepts everything and counts calls.
#[derive(Debug, Default)]
pub struct ProofVerifierStub {
    calls: AtomicUsize,
}

impl ProofVerifierStub {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProofVerifier for ProofVerifierStub {
    fn verify_proof(&self, _proof: &HeaderProof, _header: &ChainHeader) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Proof verifier that rejects everything.
#[derive(Debug, Default)]
pub struct FailingProofVerifier;

impl ProofVerifier for FailingProofVerifier {
    fn verify_proof(&self, _proof: &HeaderProof, _header: &ChainHeader) -> Result<()> {
        bail!("proof rejected")
    }
}

/// Helper: create a HeaderHash from a u8 value.
pub fn hash(n: u8) -> HeaderHash {
    let mut bytes = [0u8; 32];
    bytes[0] = n;
    HeaderHash::from(bytes)
}

/// Helper: create a HeaderHash from a short label such as `"hash1"`,
/// zero-padded on the right. Longer labels are truncated.
pub fn hash_from_label(label: &str) -> HeaderHash {
    let mut bytes = [0u8; 32];
    let len = label.len().min(32);
    bytes[..len].copy_from_slice(&label.as_bytes()[..len]);
    HeaderHash::from(bytes)
}

/// A signed shard header with both random seeds present.
pub fn shard_header(nonce: u64, round: u64) -> ChainHeader {
    ChainHeader::from(ShardHeader {
        shard_id: 0,
        core: HeaderCore {
            nonce,
            round,
            prev_rand_seed: format!("seed-{}", nonce.saturating_sub(1)).into_bytes(),
            rand_seed: format!("seed-{nonce}").into_bytes(),
            pub_keys_bitmap: b"X".to_vec(),
            signature: b"sig".to_vec(),
            ..HeaderCore::default()
        },
    })
}

/// A shard header nobody has signed yet.
pub fn unsigned_shard_header(nonce: u64, round: u64) -> ChainHeader {
    let mut header = shard_header(nonce, round);
    if let ChainHeader::Shard(shard) = &mut header {
        shard.core.pub_keys_bitmap.clear();
        shard.core.signature.clear();
    }
    header
}

/// A shard header with the given previous hash.
pub fn shard_header_on(nonce: u64, round: u64, prev_hash: HeaderHash) -> ChainHeader {
    let mut header = shard_header(nonce, round);
    if let ChainHeader::Shard(shard) = &mut header {
        shard.core.prev_hash = prev_hash;
    }
    header
}
