//! Block header representation.
//!
//! The chain-consistency core only needs a small accessor surface of a
//! header, so shard and metachain headers are kept as a sum type sharing a
//! common [`HeaderCore`].

use crate::hash::HeaderHash;

/// Shard identifier reported by metachain headers.
pub const METACHAIN_SHARD_ID: u32 = u32::MAX;

/// Aggregated proof that a quorum of validators agreed on a header.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct HeaderProof {
    /// Bitmap of the signers that contributed to the aggregated signature.
    #[cbor(n(0), with = "minicbor::bytes")]
    pub pub_keys_bitmap: Vec<u8>,
    #[cbor(n(1), with = "minicbor::bytes")]
    pub aggregated_signature: Vec<u8>,
    /// Hash of the header this proof certifies.
    #[n(2)]
    pub header_hash: HeaderHash,
    #[n(3)]
    pub header_epoch: u32,
    #[n(4)]
    pub header_nonce: u64,
    #[n(5)]
    pub header_round: u64,
    #[n(6)]
    pub header_shard_id: u32,
    #[n(7)]
    pub is_start_of_epoch: bool,
}

/// Fields shared by every header kind.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct HeaderCore {
    /// Block height
    #[n(0)]
    pub nonce: u64,
    /// Round in which the header was produced
    #[n(1)]
    pub round: u64,
    #[n(2)]
    pub epoch: u32,
    /// Hash of the predecessor header
    #[n(3)]
    pub prev_hash: HeaderHash,
    #[cbor(n(4), with = "minicbor::bytes")]
    pub prev_rand_seed: Vec<u8>,
    #[cbor(n(5), with = "minicbor::bytes")]
    pub rand_seed: Vec<u8>,
    /// Signers of this header; all-zero or empty means unsigned
    #[cbor(n(6), with = "minicbor::bytes")]
    pub pub_keys_bitmap: Vec<u8>,
    #[cbor(n(7), with = "minicbor::bytes")]
    pub signature: Vec<u8>,
    /// Proof for the predecessor, carried once equivalent proofs are active
    #[n(8)]
    pub previous_proof: Option<HeaderProof>,
}

/// A shard block header.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct ShardHeader {
    #[n(0)]
    pub shard_id: u32,
    #[n(1)]
    pub core: HeaderCore,
}

/// A metachain block header.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    minicbor::Encode,
    minicbor::Decode,
)]
pub struct MetaHeader {
    #[n(0)]
    pub core: HeaderCore,
    /// Shard headers notarized by this metachain block
    #[n(1)]
    pub shard_headers: Vec<HeaderHash>,
}

/// Any header the core can judge.
#[derive(
    Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, minicbor::Encode, minicbor::Decode,
)]
pub enum ChainHeader {
    #[n(0)]
    Shard(#[n(0)] ShardHeader),
    #[n(1)]
    Meta(#[n(0)] MetaHeader),
}

impl ChainHeader {
    pub fn core(&self) -> &HeaderCore {
        match self {
            ChainHeader::Shard(header) => &header.core,
            ChainHeader::Meta(header) => &header.core,
        }
    }

    pub fn nonce(&self) -> u64 {
        self.core().nonce
    }

    pub fn round(&self) -> u64 {
        self.core().round
    }

    pub fn epoch(&self) -> u32 {
        self.core().epoch
    }

    pub fn shard_id(&self) -> u32 {
        match self {
            ChainHeader::Shard(header) => header.shard_id,
            ChainHeader::Meta(_) => METACHAIN_SHARD_ID,
        }
    }

    pub fn prev_hash(&self) -> &HeaderHash {
        &self.core().prev_hash
    }

    pub fn rand_seed(&self) -> &[u8] {
        &self.core().rand_seed
    }

    pub fn prev_rand_seed(&self) -> &[u8] {
        &self.core().prev_rand_seed
    }

    pub fn pub_keys_bitmap(&self) -> &[u8] {
        &self.core().pub_keys_bitmap
    }

    pub fn previous_proof(&self) -> Option<&HeaderProof> {
        self.core().previous_proof.as_ref()
    }

    /// A header counts as signed once at least one signer bit is set.
    pub fn is_signed(&self) -> bool {
        self.pub_keys_bitmap().iter().any(|b| *b != 0)
    }
}

impl From<ShardHeader> for ChainHeader {
    fn from(header: ShardHeader) -> Self {
        ChainHeader::Shard(header)
    }
}

impl From<MetaHeader> for ChainHeader {
    fn from(header: MetaHeader) -> Self {
        ChainHeader::Meta(header)
    }
}
