use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Length in bytes of a content hash.
pub const HASH_LEN: usize = 32;

/// The kind of payload being digested.
///
/// `Index` nodes are structural and referenced from many places, so they are
/// always stored by hash; `Value` payloads may be inlined when small.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// An index node of a larger object.
    Index,
    /// A value payload (possibly a chunk of a larger value).
    Value,
}

/// Projection of an [`ObjectDigest`]'s tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectDigestType {
    /// The content itself is embedded in the digest.
    Inline,
    /// The digest is the hash of a value payload.
    ValueHash,
    /// The digest is the hash of an index node.
    IndexHash,
}

const TAG_INLINE: u8 = 0;
const TAG_VALUE_HASH: u8 = 1;
const TAG_INDEX_HASH: u8 = 2;

/// Content-addressed identifier for a stored object.
///
/// Computed once from `(ObjectType, content)` and never mutated. Small value
/// payloads are carried verbatim (`Inline`); everything else is identified
/// by a fixed-length content hash, with the tag keeping value and index
/// hashes of byte-identical content distinguishable.
///
/// The wire form (one tag byte followed by the payload) is a persisted-state
/// compatibility surface: it is used verbatim as row-key material.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectDigest {
    /// The content itself, at most the inline threshold in length.
    Inline(Vec<u8>),
    /// Hash of a value payload.
    ValueHash([u8; HASH_LEN]),
    /// Hash of an index node.
    IndexHash([u8; HASH_LEN]),
}

impl ObjectDigest {
    /// The tag of this digest.
    pub fn digest_type(&self) -> ObjectDigestType {
        match self {
            Self::Inline(_) => ObjectDigestType::Inline,
            Self::ValueHash(_) => ObjectDigestType::ValueHash,
            Self::IndexHash(_) => ObjectDigestType::IndexHash,
        }
    }

    /// The digest payload: the embedded content for `Inline`, the hash bytes
    /// for the two hash variants.
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Inline(content) => content,
            Self::ValueHash(hash) | Self::IndexHash(hash) => hash,
        }
    }

    /// Serialize to the wire form: tag byte + payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (tag, payload) = match self {
            Self::Inline(content) => (TAG_INLINE, content.as_slice()),
            Self::ValueHash(hash) => (TAG_VALUE_HASH, hash.as_slice()),
            Self::IndexHash(hash) => (TAG_INDEX_HASH, hash.as_slice()),
        };
        let mut bytes = Vec::with_capacity(1 + payload.len());
        bytes.push(tag);
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Parse the wire form. Fails with [`StorageError::InvalidArgument`] on
    /// an empty input, an unknown tag, or a hash payload of the wrong length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&tag, payload) = bytes
            .split_first()
            .ok_or_else(|| StorageError::InvalidArgument("empty digest".into()))?;
        match tag {
            TAG_INLINE => Ok(Self::Inline(payload.to_vec())),
            TAG_VALUE_HASH => Ok(Self::ValueHash(hash_payload(payload)?)),
            TAG_INDEX_HASH => Ok(Self::IndexHash(hash_payload(payload)?)),
            other => Err(StorageError::InvalidArgument(format!(
                "unknown digest tag: {other}"
            ))),
        }
    }

    /// Hex-encoded wire form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

fn hash_payload(payload: &[u8]) -> Result<[u8; HASH_LEN]> {
    let arr: [u8; HASH_LEN] = payload.try_into().map_err(|_| {
        StorageError::InvalidArgument(format!(
            "hash payload must be {HASH_LEN} bytes, got {}",
            payload.len()
        ))
    })?;
    Ok(arr)
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(content) => write!(f, "Inline({})", hex::encode(content)),
            Self::ValueHash(hash) => write!(f, "ValueHash({})", hex::encode(&hash[..4])),
            Self::IndexHash(hash) => write!(f, "IndexHash({})", hex::encode(&hash[..4])),
        }
    }
}

/// The identifier under which an object's content is stored: the wire form
/// of its [`ObjectDigest`], used directly as row-key material.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Vec<u8>);

impl ObjectId {
    /// Wrap raw digest bytes read back from a row. Validates the wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ObjectDigest::from_bytes(bytes)?;
        Ok(Self(bytes.to_vec()))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode back into the structured digest.
    pub fn digest(&self) -> ObjectDigest {
        // Validated on construction, so this cannot fail.
        ObjectDigest::from_bytes(&self.0).expect("object id holds a valid digest")
    }

    /// Hex-encoded identifier.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<ObjectDigest> for ObjectId {
    fn from(digest: ObjectDigest) -> Self {
        Self(digest.to_bytes())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", hex::encode(&self.0[..self.0.len().min(4)]))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
