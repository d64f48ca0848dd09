//! Row-key schema for one Opal page.
//!
//! Every page maps its state — heads, commits, objects, journals, and sync
//! bookkeeping — onto a single ordered key-value namespace. This crate owns
//! the byte-exact key layout of that namespace and the value encoding of
//! journal entries. All functions are pure; no I/O happens here.
//!
//! The key families, byte-for-byte:
//!
//! | Family | Key | Value |
//! |---|---|---|
//! | Head | `heads/` + CommitId | empty |
//! | Commit | `commits/` + CommitId | serialized commit |
//! | Object | `objects/` + ObjectId | content or content location |
//! | UnsyncedCommit | `unsynced/commits/` + CommitId | priority/metadata |
//! | TransientObject | `transient/object_ids/` + ObjectId | empty |
//! | LocalObject | `local/object_ids/` + ObjectId | empty |
//! | ImplicitJournalMeta | `journals/implicit/` + JournalId | metadata |
//! | SyncMetadata | `sync-metadata/` + key | opaque bytes |
//! | JournalEntry | `journals/` + JournalId(16B) + tag(1B) + `entry/` + key | encoded entry |
//!
//! These layouts are a persisted-state compatibility surface; any change
//! requires a coordinated migration.

pub mod journal;
pub mod rows;

pub use journal::{
    add_entry_value, decode_entry_value, delete_entry_value, entry_key, extract_object_id,
    journal_entry_key_suffix, journal_prefix, new_journal_id, EntryChange,
};
pub use rows::{
    commit_key, head_key, implicit_journal_meta_key, local_object_key, object_key,
    sync_metadata_key, transient_object_key, unsynced_commit_key, COMMIT_PREFIX, HEAD_PREFIX,
    IMPLICIT_JOURNAL_META_PREFIX, JOURNAL_PREFIX, LOCAL_OBJECT_PREFIX, OBJECT_PREFIX,
    SYNC_METADATA_PREFIX, TRANSIENT_OBJECT_PREFIX, UNSYNCED_COMMIT_PREFIX,
};
