// forkwatch common library - shared header types and collaborator traits

pub mod block_state;
pub mod crypto;
pub mod epoch_flags;
pub mod hash;
pub mod header;
pub mod providers;
pub mod rejection;

// Flattened re-exports
pub use self::block_state::BlockHeaderState;
pub use self::crypto::Blake2bHeaderHasher;
pub use self::epoch_flags::{EpochActivations, EQUIVALENT_PROOFS_FLAG};
pub use self::hash::{Hash, HeaderHash};
pub use self::header::{
    ChainHeader, HeaderCore, HeaderProof, MetaHeader, ShardHeader, METACHAIN_SHARD_ID,
};
pub use self::providers::{
    BlacklistCache, EpochFlagProvider, HeaderHasher, HeaderHashingError, NonEmptyRandSeed,
    ProofVerifier, RandSeedVerifier, RoundProvider,
};
pub use self::rejection::RejectionKind;
