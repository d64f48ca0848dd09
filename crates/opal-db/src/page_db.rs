//! The typed row surface of one page.
//!
//! [`PageDb`] wraps one open [`Database`] and exposes the page's row
//! families — heads, commits, objects, sync markers, journals — as typed
//! reads plus an atomic [`Batch`] for every mutation. The key and value
//! layouts themselves live in `opal-schema`.

use std::sync::Arc;

use opal_schema as schema;
use opal_types::{CommitId, JournalId, JournalType, ObjectId, Priority, Result, StorageError};

use crate::engine::{Database, WriteBatch};

/// One page's database handle.
///
/// Shared read/write by every consumer operating on the page (journal
/// replay, sync upload/download, garbage collection). Mutation is only ever
/// performed through [`PageDb::start_batch`].
pub struct PageDb {
    db: Arc<dyn Database>,
}

impl PageDb {
    /// Wrap an open database.
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Begin an atomic batch of mutations.
    pub fn start_batch(&self) -> Batch<'_> {
        Batch {
            db: self.db.as_ref(),
            ops: WriteBatch::new(),
        }
    }

    /// Raw point read.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db.get(key)
    }

    /// The current frontier of the page's commit DAG.
    pub fn heads(&self) -> Result<Vec<CommitId>> {
        let rows = self.db.scan_prefix(schema::HEAD_PREFIX)?;
        rows.into_iter()
            .map(|(key, _)| {
                CommitId::from_bytes(&key[schema::HEAD_PREFIX.len()..])
                    .map_err(|_| StorageError::Corruption("malformed head row key".into()))
            })
            .collect()
    }

    /// The serialized content of a commit. `NotFound` if absent.
    pub fn get_commit(&self, commit_id: &CommitId) -> Result<Vec<u8>> {
        self.db
            .get(&schema::commit_key(commit_id))?
            .ok_or(StorageError::NotFound)
    }

    /// Whether a commit row exists.
    pub fn has_commit(&self, commit_id: &CommitId) -> Result<bool> {
        Ok(self.db.get(&schema::commit_key(commit_id))?.is_some())
    }

    /// The stored content (or content location) of an object. `NotFound` if
    /// absent.
    pub fn read_object(&self, object_id: &ObjectId) -> Result<Vec<u8>> {
        self.db
            .get(&schema::object_key(object_id))?
            .ok_or(StorageError::NotFound)
    }

    /// Whether an object row exists.
    pub fn has_object(&self, object_id: &ObjectId) -> Result<bool> {
        Ok(self.db.get(&schema::object_key(object_id))?.is_some())
    }

    /// Commits still pending upload, with their stored metadata.
    pub fn unsynced_commits(&self) -> Result<Vec<(CommitId, Vec<u8>)>> {
        let rows = self.db.scan_prefix(schema::UNSYNCED_COMMIT_PREFIX)?;
        rows.into_iter()
            .map(|(key, value)| {
                let commit_id =
                    CommitId::from_bytes(&key[schema::UNSYNCED_COMMIT_PREFIX.len()..]).map_err(
                        |_| StorageError::Corruption("malformed unsynced commit row key".into()),
                    )?;
                Ok((commit_id, value))
            })
            .collect()
    }

    /// Whether the object carries the short-lived transient pin.
    pub fn is_object_transient(&self, object_id: &ObjectId) -> Result<bool> {
        Ok(self
            .db
            .get(&schema::transient_object_key(object_id))?
            .is_some())
    }

    /// Whether the object is marked locally-only.
    pub fn is_object_local(&self, object_id: &ObjectId) -> Result<bool> {
        Ok(self.db.get(&schema::local_object_key(object_id))?.is_some())
    }

    /// One sync bookkeeping value (token, cursor), if set.
    pub fn get_sync_metadata(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db.get(&schema::sync_metadata_key(key))
    }

    /// All entries of one journal, in key order, decoded.
    ///
    /// This is the read half of both journal commit (replay the changes into
    /// a new commit) and journal abort (learn which rows to purge).
    pub fn journal_entries(&self, id: &JournalId) -> Result<Vec<(Vec<u8>, schema::EntryChange)>> {
        let prefix = schema::journal_prefix(id);
        let rows = self.db.scan_prefix(&prefix)?;
        rows.into_iter()
            .map(|(key, value)| {
                let user_key = schema::journal_entry_key_suffix(id, &key)?.to_vec();
                let change = schema::decode_entry_value(&value)?;
                Ok((user_key, change))
            })
            .collect()
    }

    /// Ids of implicit journals left behind by interrupted operations.
    pub fn implicit_journal_ids(&self) -> Result<Vec<JournalId>> {
        let rows = self.db.scan_prefix(schema::IMPLICIT_JOURNAL_META_PREFIX)?;
        rows.into_iter()
            .map(|(key, _)| {
                let suffix = &key[schema::IMPLICIT_JOURNAL_META_PREFIX.len()..];
                let bytes: [u8; opal_types::JOURNAL_ID_LEN] = suffix.try_into().map_err(|_| {
                    StorageError::Corruption("malformed implicit journal row key".into())
                })?;
                Ok(JournalId::new(bytes, JournalType::Implicit))
            })
            .collect()
    }

    /// Insert a commit and update the DAG frontier in one atomic batch:
    /// the new commit row, its head row, its pending-upload marker, and the
    /// removal of every parent's head row all land together.
    ///
    /// Fails with `AlreadyExists` if the commit row is already present —
    /// duplicate insertion outside this path is a caller bug.
    pub fn insert_commit(
        &self,
        commit_id: &CommitId,
        content: &[u8],
        parent_heads: &[CommitId],
    ) -> Result<()> {
        if self.has_commit(commit_id)? {
            return Err(StorageError::AlreadyExists);
        }
        let mut batch = self.start_batch();
        batch.add_commit(commit_id, content);
        batch.add_head(commit_id);
        batch.mark_commit_unsynced(commit_id, &[]);
        for parent in parent_heads {
            batch.remove_head(parent);
        }
        batch.execute()
    }

    /// Remove every row belonging to one journal — its staged entries and,
    /// for implicit journals, its bookkeeping row — in one atomic batch.
    /// Used both after replay and on abort.
    pub fn remove_journal(&self, id: &JournalId) -> Result<()> {
        let prefix = schema::journal_prefix(id);
        let rows = self.db.scan_prefix(&prefix)?;
        let mut batch = self.start_batch();
        for (key, _) in rows {
            batch.delete(key);
        }
        if id.journal_type() == JournalType::Implicit {
            batch.delete(schema::implicit_journal_meta_key(id));
        }
        batch.execute()
    }
}

/// A set of queued mutations against one page, committed atomically by
/// [`Batch::execute`].
pub struct Batch<'a> {
    db: &'a dyn Database,
    ops: WriteBatch,
}

impl Batch<'_> {
    /// Queue a raw insert/overwrite.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.put(key, value);
    }

    /// Queue a raw removal.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.delete(key);
    }

    /// Mark a commit as a DAG frontier.
    pub fn add_head(&mut self, commit_id: &CommitId) {
        self.ops.put(schema::head_key(commit_id), Vec::new());
    }

    /// Unmark a commit as a DAG frontier.
    pub fn remove_head(&mut self, commit_id: &CommitId) {
        self.ops.delete(schema::head_key(commit_id));
    }

    /// Store a commit's serialized content.
    pub fn add_commit(&mut self, commit_id: &CommitId, content: &[u8]) {
        self.ops.put(schema::commit_key(commit_id), content.to_vec());
    }

    /// Remove a commit row.
    pub fn remove_commit(&mut self, commit_id: &CommitId) {
        self.ops.delete(schema::commit_key(commit_id));
    }

    /// Store an object's content (or content location).
    pub fn write_object(&mut self, object_id: &ObjectId, content: &[u8]) {
        self.ops.put(schema::object_key(object_id), content.to_vec());
    }

    /// Remove an object row.
    pub fn delete_object(&mut self, object_id: &ObjectId) {
        self.ops.delete(schema::object_key(object_id));
    }

    /// Mark a commit as pending upload.
    pub fn mark_commit_unsynced(&mut self, commit_id: &CommitId, metadata: &[u8]) {
        self.ops
            .put(schema::unsynced_commit_key(commit_id), metadata.to_vec());
    }

    /// Clear a commit's pending-upload marker.
    pub fn mark_commit_synced(&mut self, commit_id: &CommitId) {
        self.ops.delete(schema::unsynced_commit_key(commit_id));
    }

    /// Pin an object until its sync status is confirmed.
    pub fn mark_object_transient(&mut self, object_id: &ObjectId) {
        self.ops
            .put(schema::transient_object_key(object_id), Vec::new());
    }

    /// Mark an object as locally-only.
    pub fn mark_object_local(&mut self, object_id: &ObjectId) {
        self.ops
            .put(schema::local_object_key(object_id), Vec::new());
    }

    /// Clear both sync-status markers of an object.
    pub fn clear_object_markers(&mut self, object_id: &ObjectId) {
        self.ops.delete(schema::transient_object_key(object_id));
        self.ops.delete(schema::local_object_key(object_id));
    }

    /// Store one sync bookkeeping value.
    pub fn set_sync_metadata(&mut self, key: &[u8], value: &[u8]) {
        self.ops
            .put(schema::sync_metadata_key(key), value.to_vec());
    }

    /// Stage an add under `key` in the given journal.
    pub fn add_journal_entry(
        &mut self,
        id: &JournalId,
        key: &[u8],
        object_id: &ObjectId,
        priority: Priority,
    ) {
        self.ops.put(
            schema::entry_key(id, key),
            schema::add_entry_value(object_id, priority),
        );
    }

    /// Stage a delete of `key` in the given journal.
    pub fn add_journal_delete(&mut self, id: &JournalId, key: &[u8]) {
        self.ops
            .put(schema::entry_key(id, key), schema::delete_entry_value());
    }

    /// Store the bookkeeping row of an implicit journal.
    pub fn set_implicit_journal_meta(&mut self, id: &JournalId, metadata: &[u8]) {
        self.ops
            .put(schema::implicit_journal_meta_key(id), metadata.to_vec());
    }

    /// Commit every queued mutation atomically.
    pub fn execute(self) -> Result<()> {
        self.db.apply(self.ops)
    }
}
