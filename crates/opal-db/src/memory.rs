//! In-memory stable-storage stand-in.
//!
//! [`MemoryEnvironment`] keeps one ordered map per path for the lifetime of
//! the environment, so closing a handle and reopening the same path sees the
//! previously committed rows — the durability contract of a real engine,
//! without the engine. Intended for tests and embedding.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use opal_types::{Result, StorageError};

use crate::engine::{BatchOp, Database, Environment, WriteBatch};

type Rows = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory [`Environment`].
pub struct MemoryEnvironment {
    stable: Mutex<HashMap<PathBuf, Arc<RwLock<Rows>>>>,
    open_errors: Mutex<HashMap<PathBuf, StorageError>>,
    open_counts: Mutex<HashMap<PathBuf, u64>>,
    open_delay: Mutex<Option<Duration>>,
}

impl MemoryEnvironment {
    /// A new environment with no stored pages.
    pub fn new() -> Self {
        Self {
            stable: Mutex::new(HashMap::new()),
            open_errors: Mutex::new(HashMap::new()),
            open_counts: Mutex::new(HashMap::new()),
            open_delay: Mutex::new(None),
        }
    }

    /// Make the next open of `path` fail with `error`. Consumed by that
    /// open; later opens succeed again.
    pub fn fail_next_open(&self, path: &Path, error: StorageError) {
        self.open_errors
            .lock()
            .expect("env lock poisoned")
            .insert(path.to_path_buf(), error);
    }

    /// Sleep this long inside every open. Lets tests hold an open in flight
    /// while more requests for the same path arrive.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock().expect("env lock poisoned") = Some(delay);
    }

    /// How many physical opens `path` has seen.
    pub fn open_count(&self, path: &Path) -> u64 {
        self.open_counts
            .lock()
            .expect("env lock poisoned")
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MemoryEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for MemoryEnvironment {
    fn open(&self, path: &Path) -> Result<Arc<dyn Database>> {
        let delay = *self.open_delay.lock().expect("env lock poisoned");
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        *self
            .open_counts
            .lock()
            .expect("env lock poisoned")
            .entry(path.to_path_buf())
            .or_insert(0) += 1;

        if let Some(error) = self
            .open_errors
            .lock()
            .expect("env lock poisoned")
            .remove(path)
        {
            return Err(error);
        }

        let rows = Arc::clone(
            self.stable
                .lock()
                .expect("env lock poisoned")
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(RwLock::new(BTreeMap::new()))),
        );
        Ok(Arc::new(MemoryDatabase { rows }))
    }
}

/// One open in-memory database. Handles for the same path share rows.
struct MemoryDatabase {
    rows: Arc<RwLock<Rows>>,
}

impl Database for MemoryDatabase {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let rows = self.rows.read().expect("rows lock poisoned");
        Ok(rows.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let rows = self.rows.read().expect("rows lock poisoned");
        let range = rows.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        Ok(range
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        // The write lock makes the whole batch atomic and isolated.
        let mut rows = self.rows.write().expect("rows lock poisoned");
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    rows.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    rows.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(db: &Arc<dyn Database>, key: &[u8], value: &[u8]) {
        let mut batch = WriteBatch::new();
        batch.put(key.to_vec(), value.to_vec());
        db.apply(batch).unwrap();
    }

    #[test]
    fn rows_survive_reopen() {
        let env = MemoryEnvironment::new();
        let path = Path::new("/pages/p1");

        let db = env.open(path).unwrap();
        put(&db, b"k", b"v");
        drop(db);

        let reopened = env.open(path).unwrap();
        assert_eq!(reopened.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn paths_are_isolated() {
        let env = MemoryEnvironment::new();
        let a = env.open(Path::new("/pages/a")).unwrap();
        let b = env.open(Path::new("/pages/b")).unwrap();
        put(&a, b"k", b"from-a");
        assert_eq!(b.get(b"k").unwrap(), None);
    }

    #[test]
    fn scan_is_prefix_bounded_and_ordered() {
        let env = MemoryEnvironment::new();
        let db = env.open(Path::new("/p")).unwrap();
        let mut batch = WriteBatch::new();
        batch.put(b"heads/b".to_vec(), vec![]);
        batch.put(b"heads/a".to_vec(), vec![]);
        batch.put(b"headx".to_vec(), vec![]);
        batch.put(b"commits/a".to_vec(), vec![]);
        db.apply(batch).unwrap();

        let rows = db.scan_prefix(b"heads/").unwrap();
        let keys: Vec<&[u8]> = rows.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"heads/a"[..], &b"heads/b"[..]]);
    }

    #[test]
    fn batch_is_atomic_over_put_and_delete() {
        let env = MemoryEnvironment::new();
        let db = env.open(Path::new("/p")).unwrap();
        put(&db, b"old", b"1");

        let mut batch = WriteBatch::new();
        batch.delete(b"old".to_vec());
        batch.put(b"new".to_vec(), b"2".to_vec());
        db.apply(batch).unwrap();

        assert_eq!(db.get(b"old").unwrap(), None);
        assert_eq!(db.get(b"new").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn injected_failure_is_consumed() {
        let env = MemoryEnvironment::new();
        let path = Path::new("/pages/broken");
        env.fail_next_open(path, StorageError::Io("injected".into()));

        assert!(matches!(env.open(path), Err(StorageError::Io(_))));
        assert!(env.open(path).is_ok());
        assert_eq!(env.open_count(path), 2);
    }
}
