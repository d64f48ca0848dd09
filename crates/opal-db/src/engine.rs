//! The storage-engine collaborator seam.
//!
//! Opal does not implement an ordered key-value engine; it consumes one
//! through these traits. Any engine offering open/create, point reads,
//! prefix-ordered iteration, and atomic write batches can sit behind them.

use std::path::Path;
use std::sync::Arc;

use opal_types::Result;

/// One queued mutation inside a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite `key` with `value`.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key` if present.
    Delete { key: Vec<u8> },
}

/// An ordered set of mutations applied atomically and in isolation.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert/overwrite.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { key, value });
    }

    /// Queue a removal.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { key });
    }

    /// The queued mutations, in queue order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume the batch, yielding its mutations.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    /// Number of queued mutations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no mutations are queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// One open ordered key-value database.
///
/// Reads may run concurrently with an in-flight (unapplied) batch from
/// another writer and are not guaranteed to observe it; once
/// [`Database::apply`] returns success, every subsequent read observes the
/// full batch. Batches applied to a single database are totally ordered
/// relative to each other.
pub trait Database: Send + Sync {
    /// Point read. Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// All rows whose keys start with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply a batch atomically and in isolation relative to other batches.
    fn apply(&self, batch: WriteBatch) -> Result<()>;
}

/// Opens (creating if necessary) the database rooted at a storage path.
///
/// Writes applied before a handle is dropped must be visible to a later
/// `open` of the same path followed by a read — the engine provides
/// durability; this layer only relies on it.
pub trait Environment: Send + Sync + 'static {
    /// Open or create the database at `path`.
    fn open(&self, path: &Path) -> Result<Arc<dyn Database>>;
}
