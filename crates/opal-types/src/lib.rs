//! Foundation types for Opal, the local persistence and cloud-addressing
//! core of an offline-first, page-oriented store.
//!
//! This crate provides the identifier and error types used throughout the
//! Opal system. Every other Opal crate depends on `opal-types`.
//!
//! # Key Types
//!
//! - [`ObjectDigest`] — Content-addressed object identifier (inline payload
//!   or BLAKE3 hash, tagged by kind)
//! - [`ObjectId`] — The row-key form of an [`ObjectDigest`]
//! - [`CommitId`] — Content-addressed commit identifier
//! - [`JournalId`] — Random 16-byte identifier of an in-progress mutation
//! - [`Priority`] — Eager/lazy sync priority for staged object references
//! - [`StorageError`] — The system-wide error taxonomy

pub mod commit;
pub mod digest;
pub mod error;
pub mod journal;

pub use commit::CommitId;
pub use digest::{ObjectDigest, ObjectDigestType, ObjectId, ObjectType, HASH_LEN};
pub use error::{Result, StorageError};
pub use journal::{JournalId, JournalType, Priority, JOURNAL_ID_LEN};
