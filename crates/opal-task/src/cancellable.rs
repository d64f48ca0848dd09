use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Callback type for completion hooks.
type Hook = Box<dyn FnOnce() + Send>;

/// One outstanding asynchronous task.
///
/// Implementations resolve exactly once: whichever of cancellation and
/// completion happens first wins, and the loser observes `is_done() == true`
/// without any callback being invoked twice.
pub trait Cancellable: Send + Sync {
    /// Cancel the task. Safe to call at any time, including racing with the
    /// task's own completion; after this returns, no completion callback for
    /// the task will fire.
    fn cancel(&self);

    /// Whether the task has been canceled or has completed.
    fn is_done(&self) -> bool;

    /// Register a hook that runs after the task's completion callbacks.
    ///
    /// Registrable at most once, only before completion. Never runs if the
    /// task is canceled; a hook registered on an already-resolved task is
    /// dropped.
    fn set_on_done(&self, callback: Hook);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Pending,
    Done,
    Cancelled,
}

struct Inner {
    phase: Phase,
    on_done: Option<Hook>,
    canceler: Option<Hook>,
}

struct Shared {
    inner: Mutex<Inner>,
}

impl Shared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                phase: Phase::Pending,
                on_done: None,
                canceler: None,
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("task state lock poisoned")
    }

    fn set_canceler(&self, stop: Hook) {
        let run_now = {
            let mut inner = self.lock();
            match inner.phase {
                Phase::Pending => {
                    inner.canceler = Some(stop);
                    return;
                }
                Phase::Cancelled => Some(stop),
                Phase::Done => None,
            }
        };
        if let Some(stop) = run_now {
            stop();
        }
    }
}

/// Caller-side handle to one outstanding task.
///
/// Created together with its [`Completer`] via [`Operation::new`].
pub struct Operation {
    shared: Arc<Shared>,
}

impl Operation {
    /// Create a pending operation and the completer the issuing service uses
    /// to resolve it.
    pub fn new() -> (Arc<Operation>, Completer) {
        let shared = Shared::new();
        (
            Arc::new(Operation {
                shared: Arc::clone(&shared),
            }),
            Completer { shared },
        )
    }
}

impl Cancellable for Operation {
    fn cancel(&self) {
        let canceler = {
            let mut inner = self.shared.lock();
            if inner.phase != Phase::Pending {
                return;
            }
            inner.phase = Phase::Cancelled;
            // The on_done hook must never fire for a canceled task.
            inner.on_done = None;
            inner.canceler.take()
        };
        debug!("operation canceled");
        if let Some(stop) = canceler {
            stop();
        }
    }

    fn is_done(&self) -> bool {
        self.shared.lock().phase != Phase::Pending
    }

    fn set_on_done(&self, callback: Hook) {
        let mut inner = self.shared.lock();
        if inner.phase != Phase::Pending {
            return;
        }
        debug_assert!(inner.on_done.is_none(), "on_done registered twice");
        inner.on_done = Some(callback);
    }
}

/// Service-side resolver for one [`Operation`].
///
/// Consumed by [`Completer::complete_with`], so an operation can be resolved
/// at most once.
pub struct Completer {
    shared: Arc<Shared>,
}

impl Completer {
    /// Resolve the operation.
    ///
    /// If it has not been canceled: runs `deliver` (the operation's
    /// completion callbacks), then the registered on-done hook, and returns
    /// `true`. If it was canceled first, runs nothing and returns `false`.
    pub fn complete_with(self, deliver: impl FnOnce()) -> bool {
        let on_done = {
            let mut inner = self.shared.lock();
            if inner.phase != Phase::Pending {
                return false;
            }
            inner.phase = Phase::Done;
            inner.canceler = None;
            inner.on_done.take()
        };
        deliver();
        if let Some(hook) = on_done {
            hook();
        }
        true
    }

    /// Resolve the operation without completion callbacks of its own.
    pub fn complete(self) -> bool {
        self.complete_with(|| {})
    }

    /// Whether the operation was canceled. Lets a long-running service stop
    /// early instead of computing a result nobody will receive.
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().phase == Phase::Cancelled
    }

    /// Register the hook that [`Cancellable::cancel`] uses to stop the
    /// underlying work (for example aborting a spawned task).
    ///
    /// If the operation was already canceled, the hook runs immediately.
    pub fn set_canceler(&self, stop: Hook) {
        self.shared.set_canceler(stop);
    }
}

/// Run a future as a cancellable task on the tokio runtime.
///
/// `on_result` receives the future's output and plays the role of the
/// operation's completion callback: it never runs after [`cancel`] returns,
/// and any registered on-done hook runs after it. Canceling aborts the
/// spawned task.
///
/// [`cancel`]: Cancellable::cancel
pub fn spawn_cancellable<F, T, C>(future: F, on_result: C) -> Arc<Operation>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    C: FnOnce(T) + Send + 'static,
{
    let (operation, completer) = Operation::new();
    let shared = Arc::clone(&operation.shared);
    let handle = tokio::spawn(async move {
        let output = future.await;
        completer.complete_with(move || on_result(output));
    });
    // Registered after the spawn; set_canceler runs it immediately if the
    // race was lost to an early cancel.
    shared.set_canceler(Box::new(move || handle.abort()));
    operation
}
