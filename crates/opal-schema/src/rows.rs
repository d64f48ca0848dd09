//! Key builders for the fixed row families of one page namespace.

use opal_types::{CommitId, JournalId, ObjectId};

/// Prefix of head rows.
pub const HEAD_PREFIX: &[u8] = b"heads/";
/// Prefix of commit rows.
pub const COMMIT_PREFIX: &[u8] = b"commits/";
/// Prefix of object rows.
pub const OBJECT_PREFIX: &[u8] = b"objects/";
/// Prefix of pending-upload commit markers.
pub const UNSYNCED_COMMIT_PREFIX: &[u8] = b"unsynced/commits/";
/// Prefix of short-lived object pins not yet confirmed synced.
pub const TRANSIENT_OBJECT_PREFIX: &[u8] = b"transient/object_ids/";
/// Prefix of locally-only object markers.
pub const LOCAL_OBJECT_PREFIX: &[u8] = b"local/object_ids/";
/// Prefix of bookkeeping rows for auto-commit journals.
pub const IMPLICIT_JOURNAL_META_PREFIX: &[u8] = b"journals/implicit/";
/// Prefix of sync bookkeeping rows (tokens, cursors).
pub const SYNC_METADATA_PREFIX: &[u8] = b"sync-metadata/";
/// Prefix shared by all journal entry rows.
pub const JOURNAL_PREFIX: &[u8] = b"journals/";

fn concat(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

/// Row key marking `commit_id` as a DAG frontier.
pub fn head_key(commit_id: &CommitId) -> Vec<u8> {
    concat(HEAD_PREFIX, commit_id.as_bytes())
}

/// Row key of the durable storage of `commit_id`.
pub fn commit_key(commit_id: &CommitId) -> Vec<u8> {
    concat(COMMIT_PREFIX, commit_id.as_bytes())
}

/// Row key of the durable storage of `object_id`.
pub fn object_key(object_id: &ObjectId) -> Vec<u8> {
    concat(OBJECT_PREFIX, object_id.as_bytes())
}

/// Row key marking `commit_id` as pending upload.
pub fn unsynced_commit_key(commit_id: &CommitId) -> Vec<u8> {
    concat(UNSYNCED_COMMIT_PREFIX, commit_id.as_bytes())
}

/// Row key pinning `object_id` until its sync status is confirmed.
pub fn transient_object_key(object_id: &ObjectId) -> Vec<u8> {
    concat(TRANSIENT_OBJECT_PREFIX, object_id.as_bytes())
}

/// Row key marking `object_id` as locally-only.
pub fn local_object_key(object_id: &ObjectId) -> Vec<u8> {
    concat(LOCAL_OBJECT_PREFIX, object_id.as_bytes())
}

/// Row key of the bookkeeping entry for an implicit journal.
pub fn implicit_journal_meta_key(journal_id: &JournalId) -> Vec<u8> {
    concat(IMPLICIT_JOURNAL_META_PREFIX, journal_id.as_bytes())
}

/// Row key of one sync bookkeeping entry.
pub fn sync_metadata_key(key: &[u8]) -> Vec<u8> {
    concat(SYNC_METADATA_PREFIX, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_types::{JournalType, ObjectDigest, JOURNAL_ID_LEN};

    fn commit_id() -> CommitId {
        CommitId::from_hash([0x11; 32])
    }

    fn object_id() -> ObjectId {
        ObjectDigest::Inline(b"obj".to_vec()).into()
    }

    #[test]
    fn head_key_layout() {
        let key = head_key(&commit_id());
        assert!(key.starts_with(b"heads/"));
        assert_eq!(&key[6..], commit_id().as_bytes());
    }

    #[test]
    fn commit_and_head_keys_differ() {
        assert_ne!(head_key(&commit_id()), commit_key(&commit_id()));
    }

    #[test]
    fn object_marker_families_are_disjoint() {
        let id = object_id();
        let keys = [
            object_key(&id),
            transient_object_key(&id),
            local_object_key(&id),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn sync_metadata_key_layout() {
        assert_eq!(sync_metadata_key(b"cursor"), b"sync-metadata/cursor".to_vec());
    }

    #[test]
    fn implicit_meta_sits_under_journal_prefix() {
        let id = JournalId::new([7u8; JOURNAL_ID_LEN], JournalType::Implicit);
        let key = implicit_journal_meta_key(&id);
        assert!(key.starts_with(JOURNAL_PREFIX));
        assert!(key.starts_with(b"journals/implicit/"));
    }
}
