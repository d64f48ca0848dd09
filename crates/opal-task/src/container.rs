use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::cancellable::Cancellable;

struct Members {
    next_key: u64,
    members: HashMap<u64, Arc<dyn Cancellable>>,
}

/// An owned set of pending [`Cancellable`]s.
///
/// The container holds a strong reference to every member; each member's
/// on-done hook holds only a weak reference back into the member map, so
/// there is no ownership cycle and completed tasks remove themselves. The
/// set therefore only ever contains still-pending work.
///
/// Dropping the container (or calling [`CancellableContainer::reset`])
/// cancels every remaining member, which is what makes teardown of a page
/// with outstanding fetches leak-free.
pub struct CancellableContainer {
    inner: Arc<Mutex<Members>>,
}

impl CancellableContainer {
    /// An empty container.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Members {
                next_key: 0,
                members: HashMap::new(),
            })),
        }
    }

    /// Take ownership of `task` until it completes or the container goes
    /// away.
    pub fn add(&self, task: Arc<dyn Cancellable>) {
        let key = {
            let mut members = self.lock();
            let key = members.next_key;
            members.next_key += 1;
            key
        };

        // Self-removal hook. Registered before insertion so a task that
        // resolves mid-add is covered by the is_done sweep below.
        let weak: Weak<Mutex<Members>> = Arc::downgrade(&self.inner);
        task.set_on_done(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .lock()
                    .expect("container lock poisoned")
                    .members
                    .remove(&key);
            }
        }));

        self.lock().members.insert(key, Arc::clone(&task));
        if task.is_done() {
            // Resolved before (or while) the hook was registered; the hook
            // may never fire, so drop the entry here.
            self.lock().members.remove(&key);
        }
    }

    /// Cancel every currently-held member and empty the set.
    pub fn reset(&self) {
        let drained: Vec<Arc<dyn Cancellable>> = {
            let mut members = self.lock();
            members.members.drain().map(|(_, task)| task).collect()
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), "canceling pending tasks");
        }
        // Cancel outside the lock: cancel() may run hooks that touch the map.
        for task in drained {
            task.cancel();
        }
    }

    /// Number of still-pending members.
    pub fn len(&self) -> usize {
        self.lock().members.len()
    }

    /// Whether no members are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().members.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Members> {
        self.inner.lock().expect("container lock poisoned")
    }
}

impl Default for CancellableContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancellableContainer {
    fn drop(&mut self) {
        self.reset();
    }
}
