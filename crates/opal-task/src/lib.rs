//! Cancellable task lifecycle for Opal.
//!
//! Every asynchronous boundary in the system — database opens, cloud
//! fetches, credential refreshes — shares one cancellation contract:
//!
//! - After [`Cancellable::cancel`] returns, no completion callback for that
//!   task ever fires.
//! - [`Cancellable::is_done`] becomes (and stays) `true` exactly once the
//!   task has either been canceled or fired its completion callbacks.
//! - An `on_done` hook registered via [`Cancellable::set_on_done`] fires
//!   after the completion callbacks, and never if the task was canceled.
//!
//! The [`Operation`]/[`Completer`] pair encodes "at most one resolution,
//! never after cancellation" in the type system: the issuing service holds
//! the [`Completer`] and resolves it at most once; the caller holds the
//! [`Operation`]. [`spawn_cancellable`] bridges tokio futures onto the same
//! contract. [`AutoCancel`] bounds one task to a scope, and
//! [`CancellableContainer`] owns a set of pending tasks and guarantees
//! leak-free teardown.

pub mod auto_cancel;
pub mod cancellable;
pub mod container;

pub use auto_cancel::AutoCancel;
pub use cancellable::{spawn_cancellable, Cancellable, Completer, Operation};
pub use container::CancellableContainer;
