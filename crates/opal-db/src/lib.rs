//! Per-page database lifecycle for Opal.
//!
//! Each page persists its state in one ordered key-value database. The
//! engine itself is an external collaborator reached through the
//! [`Database`]/[`Environment`] seam; this crate owns everything above it:
//!
//! - [`PageDb`] — the typed row surface of one page (heads, commits,
//!   objects, sync markers, journals), where every mutation goes through an
//!   atomic [`Batch`]
//! - [`PageDbFactory`] — opens or reuses the database behind a page's
//!   storage path, coalescing concurrent requests for the same path onto a
//!   single physical open
//! - [`MemoryEnvironment`] — an in-memory stable-storage stand-in for tests
//!   and embedding
//!
//! # Design Rules
//!
//! 1. Mutation only ever happens through [`Batch::execute`]; there are no
//!    unguarded key writes. This is what keeps the head-update invariant
//!    intact under concurrent writers.
//! 2. A failed open is never cached: the next request for the same path
//!    retries from scratch.
//! 3. Malformed rows are reported as errors, never silently skipped.

pub mod engine;
pub mod factory;
pub mod memory;
pub mod page_db;

pub use engine::{BatchOp, Database, Environment, WriteBatch};
pub use factory::PageDbFactory;
pub use memory::MemoryEnvironment;
pub use page_db::{Batch, PageDb};
