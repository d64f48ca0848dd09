use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Length in bytes of the random portion of a journal id.
pub const JOURNAL_ID_LEN: usize = 16;

/// How a journal was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalType {
    /// A single auto-committed operation.
    Implicit,
    /// A multi-operation transaction demarcated by the caller.
    Explicit,
}

impl JournalType {
    /// The one-byte tag persisted in row keys.
    pub fn tag(self) -> u8 {
        match self {
            Self::Implicit => b'I',
            Self::Explicit => b'E',
        }
    }

    /// Parse a persisted tag byte.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            b'I' => Ok(Self::Implicit),
            b'E' => Ok(Self::Explicit),
            other => Err(StorageError::InvalidArgument(format!(
                "unknown journal type tag: {other}"
            ))),
        }
    }
}

/// Identifier of an in-progress page mutation.
///
/// Sixteen random bytes plus a type tag. Created when a mutation begins and
/// consumed (replayed into a new commit, or discarded) when it ends. Ids are
/// drawn from a large enough random space that reuse is not relied upon for
/// correctness; a journal's rows are always fully removed before its id
/// could recur.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JournalId {
    bytes: [u8; JOURNAL_ID_LEN],
    journal_type: JournalType,
}

impl JournalId {
    /// Assemble a journal id from its parts.
    pub fn new(bytes: [u8; JOURNAL_ID_LEN], journal_type: JournalType) -> Self {
        Self {
            bytes,
            journal_type,
        }
    }

    /// The random portion of the id.
    pub fn as_bytes(&self) -> &[u8; JOURNAL_ID_LEN] {
        &self.bytes
    }

    /// The journal's type.
    pub fn journal_type(&self) -> JournalType {
        self.journal_type
    }

    /// Hex-encoded random portion.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for JournalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JournalId({}, {:?})",
            hex::encode(&self.bytes[..4]),
            self.journal_type
        )
    }
}

/// Sync priority of a staged object reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Upload as soon as possible.
    Eager,
    /// Upload only when referenced content is actually needed remotely.
    Lazy,
}

impl Priority {
    /// The one-byte tag persisted in journal entry values.
    pub fn tag(self) -> u8 {
        match self {
            Self::Eager => b'E',
            Self::Lazy => b'L',
        }
    }

    /// Parse a persisted tag byte.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            b'E' => Ok(Self::Eager),
            b'L' => Ok(Self::Lazy),
            other => Err(StorageError::InvalidArgument(format!(
                "unknown priority tag: {other}"
            ))),
        }
    }
}
