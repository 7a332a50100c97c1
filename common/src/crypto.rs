//! Header hashing: canonical CBOR encoding followed by Blake2b-256.

use blake2::{digest::consts::U32, Blake2b, Digest};

use crate::hash::HeaderHash;
use crate::header::ChainHeader;
use crate::providers::{HeaderHasher, HeaderHashingError};

/// Get a Blake2b-256 hash of arbitrary bytes
pub fn blake2b_256(data: &[u8]) -> HeaderHash {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    HeaderHash::new(bytes)
}

/// Default [`HeaderHasher`]: `minicbor` array encoding of the header, hashed
/// with Blake2b-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake2bHeaderHasher;

impl HeaderHasher for Blake2bHeaderHasher {
    fn serialize(&self, header: &ChainHeader) -> Result<Vec<u8>, HeaderHashingError> {
        minicbor::to_vec(header).map_err(|e| HeaderHashingError(e.to_string()))
    }

    fn hash(&self, bytes: &[u8]) -> HeaderHash {
        blake2b_256(bytes)
    }
}
