use std::sync::Arc;

use crate::cancellable::Cancellable;

/// Scope-bound holder of at most one [`Cancellable`].
///
/// Whatever it currently wraps is canceled when the holder is dropped or
/// replaced via [`AutoCancel::reset`], so no task started under this scope
/// outlives the scope.
#[derive(Default)]
pub struct AutoCancel {
    current: Option<Arc<dyn Cancellable>>,
}

impl AutoCancel {
    /// An empty holder.
    pub fn new() -> Self {
        Self { current: None }
    }

    /// A holder wrapping `task`.
    pub fn wrapping(task: Arc<dyn Cancellable>) -> Self {
        Self {
            current: Some(task),
        }
    }

    /// Replace the held task, canceling the previous one (if any).
    pub fn reset(&mut self, task: Option<Arc<dyn Cancellable>>) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.current = task;
    }

    /// Whether a task is currently held.
    pub fn is_armed(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for AutoCancel {
    fn drop(&mut self) {
        if let Some(task) = self.current.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellable::Operation;

    #[test]
    fn drop_cancels_the_held_task() {
        let (op, _completer) = Operation::new();
        {
            let _guard = AutoCancel::wrapping(op.clone());
            assert!(!op.is_done());
        }
        assert!(op.is_done());
    }

    #[test]
    fn reset_cancels_the_previous_task_only() {
        let (first, _c1) = Operation::new();
        let (second, _c2) = Operation::new();

        let mut guard = AutoCancel::wrapping(first.clone());
        guard.reset(Some(second.clone()));

        assert!(first.is_done());
        assert!(!second.is_done());
        drop(guard);
        assert!(second.is_done());
    }

    #[test]
    fn reset_to_none_disarms() {
        let (op, _completer) = Operation::new();
        let mut guard = AutoCancel::wrapping(op.clone());
        guard.reset(None);
        assert!(op.is_done());
        assert!(!guard.is_armed());
    }

    #[test]
    fn completed_task_is_dropped_without_effect() {
        let (op, completer) = Operation::new();
        assert!(completer.complete());
        let guard = AutoCancel::wrapping(op.clone());
        drop(guard);
        // Already done; cancel was a no-op.
        assert!(op.is_done());
    }
}
