use opal_types::{CommitId, ObjectDigest, ObjectType, HASH_LEN};

/// Largest value payload that is embedded verbatim in its digest.
///
/// This constant is a persisted-state compatibility surface: changing it
/// changes the identifiers of previously stored objects.
pub const INLINE_THRESHOLD: usize = 32;

/// Domain tag separating commit hashes from object content hashes.
const COMMIT_DOMAIN: &[u8] = b"opal-commit-v1";

/// Length-prefixed BLAKE3 content hash.
///
/// The payload length (little-endian `u64`) is fed to the hasher before the
/// payload itself.
pub fn content_hash(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(data.len() as u64).to_le_bytes());
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Compute the digest of a payload using [`INLINE_THRESHOLD`].
pub fn compute_digest(kind: ObjectType, content: &[u8]) -> ObjectDigest {
    compute_digest_with_threshold(kind, content, INLINE_THRESHOLD)
}

/// Compute the digest of a payload with an explicit inline threshold.
///
/// Exists for callers that must stay compatible with data persisted under a
/// different threshold. Index nodes are never inlined regardless of the
/// threshold.
pub fn compute_digest_with_threshold(
    kind: ObjectType,
    content: &[u8],
    threshold: usize,
) -> ObjectDigest {
    match kind {
        ObjectType::Index => ObjectDigest::IndexHash(content_hash(content)),
        ObjectType::Value if content.len() <= threshold => {
            ObjectDigest::Inline(content.to_vec())
        }
        ObjectType::Value => ObjectDigest::ValueHash(content_hash(content)),
    }
}

/// Derive a commit identifier from serialized commit content.
///
/// Domain-separated from object hashing so a commit and an object with
/// byte-identical serialization can never share an identifier.
pub fn compute_commit_id(content: &[u8]) -> CommitId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(COMMIT_DOMAIN);
    hasher.update(b":");
    hasher.update(&(content.len() as u64).to_le_bytes());
    hasher.update(content);
    CommitId::from_hash(*hasher.finalize().as_bytes())
}
