//! Journal id generation and journal entry row encoding.
//!
//! A journal entry row key is:
//!
//! ```text
//! journals/ + id(16 bytes) + type tag(1 byte, 'I'/'E') + entry/ + user key
//! ```
//!
//! and its value is either `'A'` + priority tag + object-id bytes (a staged
//! add) or the single byte `'D'` (a staged delete). Malformed values are
//! reported as errors, never ignored.

use rand::Rng;

use opal_types::{
    JournalId, JournalType, ObjectId, Priority, Result, StorageError, JOURNAL_ID_LEN,
};

use crate::rows::JOURNAL_PREFIX;

const ENTRY_SEGMENT: &[u8] = b"entry/";

const OP_ADD: u8 = b'A';
const OP_DELETE: u8 = b'D';

/// One staged mutation, decoded from a journal entry row value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryChange {
    /// Stage a value under the entry's key, referencing a stored object.
    Add {
        /// The referenced object.
        object_id: ObjectId,
        /// Sync priority of the referenced object.
        priority: Priority,
    },
    /// Stage a deletion of the entry's key.
    Delete,
}

/// Draw a fresh random journal id.
///
/// The generator is injected so callers (and tests) control determinism.
pub fn new_journal_id<R: Rng>(rng: &mut R, journal_type: JournalType) -> JournalId {
    let mut bytes = [0u8; JOURNAL_ID_LEN];
    rng.fill(&mut bytes[..]);
    JournalId::new(bytes, journal_type)
}

/// The exact key prefix covering every entry of one journal.
///
/// An ordered range scan over this prefix yields the journal's entries in
/// key order; the same prefix is used to purge them on abort.
pub fn journal_prefix(id: &JournalId) -> Vec<u8> {
    let mut prefix =
        Vec::with_capacity(JOURNAL_PREFIX.len() + JOURNAL_ID_LEN + 1 + ENTRY_SEGMENT.len());
    prefix.extend_from_slice(JOURNAL_PREFIX);
    prefix.extend_from_slice(id.as_bytes());
    prefix.push(id.journal_type().tag());
    prefix.extend_from_slice(ENTRY_SEGMENT);
    prefix
}

/// Row key of the journal entry staged for `key`.
pub fn entry_key(id: &JournalId, key: &[u8]) -> Vec<u8> {
    let mut row_key = journal_prefix(id);
    row_key.extend_from_slice(key);
    row_key
}

/// Recover the user key from a full entry row key returned by a prefix scan.
pub fn journal_entry_key_suffix<'a>(id: &JournalId, row_key: &'a [u8]) -> Result<&'a [u8]> {
    let prefix = journal_prefix(id);
    row_key.strip_prefix(prefix.as_slice()).ok_or_else(|| {
        StorageError::InvalidArgument(format!(
            "row key does not belong to journal {}",
            id.to_hex()
        ))
    })
}

/// Encode the value of a staged add.
pub fn add_entry_value(object_id: &ObjectId, priority: Priority) -> Vec<u8> {
    let id_bytes = object_id.as_bytes();
    let mut value = Vec::with_capacity(2 + id_bytes.len());
    value.push(OP_ADD);
    value.push(priority.tag());
    value.extend_from_slice(id_bytes);
    value
}

/// Encode the value of a staged delete.
pub fn delete_entry_value() -> Vec<u8> {
    vec![OP_DELETE]
}

/// Decode a journal entry row value.
pub fn decode_entry_value(value: &[u8]) -> Result<EntryChange> {
    match value.first() {
        Some(&OP_DELETE) if value.len() == 1 => Ok(EntryChange::Delete),
        Some(&OP_DELETE) => Err(StorageError::InvalidArgument(
            "delete entry carries trailing bytes".into(),
        )),
        Some(&OP_ADD) => {
            if value.len() < 3 {
                return Err(StorageError::InvalidArgument(
                    "add entry too short for priority and object id".into(),
                ));
            }
            let priority = Priority::from_tag(value[1])?;
            let object_id = ObjectId::from_bytes(&value[2..])?;
            Ok(EntryChange::Add {
                object_id,
                priority,
            })
        }
        Some(&op) => Err(StorageError::InvalidArgument(format!(
            "unknown journal entry op: {op}"
        ))),
        None => Err(StorageError::InvalidArgument("empty journal entry".into())),
    }
}

/// Decode the object reference out of a staged add value.
///
/// Fails with [`StorageError::InvalidArgument`] if the value is malformed or
/// is a staged delete.
pub fn extract_object_id(value: &[u8]) -> Result<ObjectId> {
    match decode_entry_value(value)? {
        EntryChange::Add { object_id, .. } => Ok(object_id),
        EntryChange::Delete => Err(StorageError::InvalidArgument(
            "entry is a delete, not an object reference".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_crypto::compute_digest;
    use opal_types::ObjectType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn object_id() -> ObjectId {
        compute_digest(ObjectType::Value, b"payload").into()
    }

    #[test]
    fn journal_ids_are_deterministic_under_a_seeded_rng() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let id_a = new_journal_id(&mut a, JournalType::Implicit);
        let id_b = new_journal_id(&mut b, JournalType::Implicit);
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn distinct_draws_give_distinct_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = new_journal_id(&mut rng, JournalType::Explicit);
        let b = new_journal_id(&mut rng, JournalType::Explicit);
        assert_ne!(a, b);
    }

    #[test]
    fn prefix_layout() {
        let id = JournalId::new([0xab; JOURNAL_ID_LEN], JournalType::Implicit);
        let prefix = journal_prefix(&id);
        assert!(prefix.starts_with(b"journals/"));
        assert_eq!(&prefix[9..9 + JOURNAL_ID_LEN], &[0xab; JOURNAL_ID_LEN]);
        assert_eq!(prefix[9 + JOURNAL_ID_LEN], b'I');
        assert!(prefix.ends_with(b"entry/"));
    }

    #[test]
    fn implicit_and_explicit_prefixes_differ() {
        let implicit = JournalId::new([1; JOURNAL_ID_LEN], JournalType::Implicit);
        let explicit = JournalId::new([1; JOURNAL_ID_LEN], JournalType::Explicit);
        assert_ne!(journal_prefix(&implicit), journal_prefix(&explicit));
    }

    #[test]
    fn entry_key_extends_the_prefix() {
        let id = JournalId::new([2; JOURNAL_ID_LEN], JournalType::Explicit);
        let key = entry_key(&id, b"user-key");
        assert!(key.starts_with(journal_prefix(&id).as_slice()));
        assert_eq!(journal_entry_key_suffix(&id, &key).unwrap(), b"user-key");
    }

    #[test]
    fn foreign_row_key_is_rejected() {
        let id = JournalId::new([2; JOURNAL_ID_LEN], JournalType::Explicit);
        let other = JournalId::new([3; JOURNAL_ID_LEN], JournalType::Explicit);
        let key = entry_key(&other, b"k");
        assert!(journal_entry_key_suffix(&id, &key).is_err());
    }

    #[test]
    fn add_value_roundtrip() {
        let id = object_id();
        for priority in [Priority::Eager, Priority::Lazy] {
            let value = add_entry_value(&id, priority);
            assert_eq!(
                decode_entry_value(&value).unwrap(),
                EntryChange::Add {
                    object_id: id.clone(),
                    priority
                }
            );
            assert_eq!(extract_object_id(&value).unwrap(), id);
        }
    }

    #[test]
    fn delete_value_roundtrip() {
        let value = delete_entry_value();
        assert_eq!(decode_entry_value(&value).unwrap(), EntryChange::Delete);
        assert!(extract_object_id(&value).is_err());
    }

    #[test]
    fn malformed_values_are_invalid_argument() {
        for bad in [
            &[][..],
            &b"Z"[..],
            &b"A"[..],
            &b"AE"[..],
            &b"AX\x00abc"[..],
            &b"Dtrailing"[..],
        ] {
            assert!(
                matches!(
                    decode_entry_value(bad),
                    Err(StorageError::InvalidArgument(_))
                ),
                "expected invalid argument for {bad:?}"
            );
        }
    }

    #[test]
    fn add_value_with_corrupt_object_id_is_invalid() {
        // Tag 9 is not a valid digest tag.
        let value = [b'A', b'E', 9, 1, 2];
        assert!(decode_entry_value(&value).is_err());
    }
}
