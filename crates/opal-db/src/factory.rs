//! Opens page databases, coalescing concurrent requests.
//!
//! Per-path state machine: `Absent → Opening → {Ready | Failed}`. While an
//! open is in flight every further request for the same path queues onto it
//! instead of racing into a second physical open. A failure is never cached;
//! the next request re-enters `Opening`. A `Ready` entry persists until
//! explicitly evicted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use opal_task::{spawn_cancellable, Operation};
use opal_types::{Result, StorageError};

use crate::engine::Environment;
use crate::page_db::PageDb;

type OpenResult = Result<Arc<PageDb>>;

enum Slot {
    /// An open is in flight; every sender resolves with its outcome.
    Opening(Vec<oneshot::Sender<OpenResult>>),
    /// The database is open and shared.
    Ready(Arc<PageDb>),
}

struct Inner {
    env: Arc<dyn Environment>,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

/// Creates, caches, and reopens per-page database instances.
///
/// The path → state map is the one piece of shared mutable state in this
/// layer; it is guarded by a mutex so requests for different paths proceed
/// independently while requests for the same path coalesce.
#[derive(Clone)]
pub struct PageDbFactory {
    inner: Arc<Inner>,
}

impl PageDbFactory {
    /// A factory opening databases through `env`.
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self {
            inner: Arc::new(Inner {
                env,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Open or reuse the database rooted at `path`.
    ///
    /// Resolves with a handle to the (possibly shared) [`PageDb`] on
    /// success. On failure nothing is cached, so the next call retries from
    /// scratch.
    pub async fn get_or_create(&self, path: &Path) -> OpenResult {
        let receiver = {
            let mut slots = self.inner.lock_slots();
            match slots.get_mut(path) {
                Some(Slot::Ready(db)) => return Ok(Arc::clone(db)),
                Some(Slot::Opening(waiters)) => {
                    debug!(path = %path.display(), "coalescing onto in-flight open");
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    rx
                }
                None => {
                    let (tx, rx) = oneshot::channel();
                    slots.insert(path.to_path_buf(), Slot::Opening(vec![tx]));
                    self.spawn_open(path.to_path_buf());
                    rx
                }
            }
        };

        receiver
            .await
            .map_err(|_| StorageError::Internal("open task dropped its waiters".into()))?
    }

    /// Callback form of [`PageDbFactory::get_or_create`], bounded by the
    /// returned cancellable: after `cancel()` the completion never fires.
    pub fn get_or_create_with_callback(
        &self,
        path: &Path,
        completion: impl FnOnce(OpenResult) + Send + 'static,
    ) -> Arc<Operation> {
        let this = self.clone();
        let path = path.to_path_buf();
        spawn_cancellable(
            async move { this.get_or_create(&path).await },
            completion,
        )
    }

    /// Drop the cached instance for `path`, if any. Outstanding handles stay
    /// valid; the next request performs a fresh physical open. An in-flight
    /// open is left alone so its waiters still resolve.
    pub fn evict(&self, path: &Path) {
        let mut slots = self.inner.lock_slots();
        if matches!(slots.get(path), Some(Slot::Ready(_))) {
            slots.remove(path);
        }
    }

    /// Whether a ready instance is currently cached for `path`.
    pub fn is_cached(&self, path: &Path) -> bool {
        matches!(self.inner.lock_slots().get(path), Some(Slot::Ready(_)))
    }

    /// Perform the physical open on the blocking pool, then resolve every
    /// queued waiter with the shared outcome. Runs detached so waiters are
    /// always resolved even if the initiating caller goes away.
    fn spawn_open(&self, path: PathBuf) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let env = Arc::clone(&inner.env);
            let open_path = path.clone();
            let result: OpenResult =
                match tokio::task::spawn_blocking(move || env.open(&open_path)).await {
                    Ok(Ok(db)) => Ok(Arc::new(PageDb::new(db))),
                    Ok(Err(err)) => Err(err),
                    Err(join_err) => Err(StorageError::Internal(format!(
                        "database open task failed: {join_err}"
                    ))),
                };

            let waiters = {
                let mut slots = inner.lock_slots();
                let previous = match &result {
                    Ok(db) => {
                        debug!(path = %path.display(), "page database ready");
                        slots.insert(path.clone(), Slot::Ready(Arc::clone(db)))
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "page database open failed");
                        slots.remove(&path)
                    }
                };
                match previous {
                    Some(Slot::Opening(waiters)) => waiters,
                    // The slot was evicted while the open was in flight.
                    _ => Vec::new(),
                }
            };

            for waiter in waiters {
                // A waiter that stopped listening is fine to skip.
                let _ = waiter.send(result.clone());
            }
        });
    }
}

impl Inner {
    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Slot>> {
        self.slots.lock().expect("factory slot map poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use opal_task::Cancellable;

    use crate::memory::MemoryEnvironment;

    fn factory() -> (Arc<MemoryEnvironment>, PageDbFactory) {
        let env = Arc::new(MemoryEnvironment::new());
        let factory = PageDbFactory::new(env.clone());
        (env, factory)
    }

    #[tokio::test]
    async fn writes_survive_eviction_and_reopen() {
        let (_env, factory) = factory();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durable");
        let path = path.as_path();

        let db = factory.get_or_create(path).await.unwrap();
        let mut batch = db.start_batch();
        batch.put(b"k".to_vec(), b"v".to_vec());
        batch.execute().unwrap();
        drop(db);

        factory.evict(path);
        assert!(!factory.is_cached(path));

        let reopened = factory.get_or_create(path).await.unwrap();
        assert_eq!(reopened.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_physical_open() {
        let (env, factory) = factory();
        let path = Path::new("/pages/coalesced");
        env.set_open_delay(Duration::from_millis(50));

        let (first, second) =
            tokio::join!(factory.get_or_create(path), factory.get_or_create(path));
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(env.open_count(path), 1);

        // A write through one resolved handle is visible through the other.
        let mut batch = first.start_batch();
        batch.put(b"shared".to_vec(), b"yes".to_vec());
        batch.execute().unwrap();
        assert_eq!(second.get(b"shared").unwrap(), Some(b"yes".to_vec()));
    }

    #[tokio::test]
    async fn ready_instances_are_reused_without_reopening() {
        let (env, factory) = factory();
        let path = Path::new("/pages/cached");

        let a = factory.get_or_create(path).await.unwrap();
        let b = factory.get_or_create(path).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(env.open_count(path), 1);
        assert!(factory.is_cached(path));
    }

    #[tokio::test]
    async fn different_paths_open_independently() {
        let (env, factory) = factory();
        let (a, b) = tokio::join!(
            factory.get_or_create(Path::new("/pages/a")),
            factory.get_or_create(Path::new("/pages/b"))
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(env.open_count(Path::new("/pages/a")), 1);
        assert_eq!(env.open_count(Path::new("/pages/b")), 1);
    }

    #[tokio::test]
    async fn failure_is_not_cached_and_fans_out() {
        let (env, factory) = factory();
        let path = Path::new("/pages/flaky");
        env.set_open_delay(Duration::from_millis(50));
        env.fail_next_open(path, StorageError::Io("injected".into()));

        let (first, second) =
            tokio::join!(factory.get_or_create(path), factory.get_or_create(path));
        assert!(matches!(first, Err(StorageError::Io(_))));
        assert!(matches!(second, Err(StorageError::Io(_))));
        assert!(!factory.is_cached(path));
        // One physical attempt served both callers.
        assert_eq!(env.open_count(path), 1);

        // The next request retries from scratch and succeeds.
        assert!(factory.get_or_create(path).await.is_ok());
        assert_eq!(env.open_count(path), 2);
    }

    #[tokio::test]
    async fn callback_form_delivers_the_handle() {
        let (_env, factory) = factory();
        let (tx, rx) = oneshot::channel();
        factory.get_or_create_with_callback(Path::new("/pages/cb"), move |result| {
            tx.send(result.is_ok()).ok();
        });
        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn canceled_callback_never_fires() {
        let (env, factory) = factory();
        env.set_open_delay(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&fired);
        let op = factory.get_or_create_with_callback(Path::new("/pages/late"), move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
        op.cancel();
        assert!(op.is_done());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
