use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::HASH_LEN;
use crate::error::{Result, StorageError};

/// Opaque, immutable identifier of a commit.
///
/// Derived by hashing commit content; commits form a DAG via parent
/// references and are never mutated after creation. The raw bytes are used
/// directly as row-key material.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId([u8; HASH_LEN]);

impl CommitId {
    /// Wrap a pre-computed commit hash.
    pub fn from_hash(hash: [u8; HASH_LEN]) -> Self {
        Self(hash)
    }

    /// Parse raw bytes read back from a row key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            StorageError::InvalidArgument(format!(
                "commit id must be {HASH_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// The raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
