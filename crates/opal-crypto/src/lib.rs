//! Content-addressing primitives for Opal.
//!
//! This crate turns byte payloads into immutable, content-addressed
//! identifiers. It is pure: no I/O, no state, and the only failure mode is
//! malformed input to the decode paths in `opal-types`.
//!
//! # Digest rules
//!
//! - Index nodes are always stored by hash, regardless of size — they are
//!   referenced from many places and inlining would duplicate large
//!   structural data.
//! - Value payloads at most [`INLINE_THRESHOLD`] bytes long are embedded
//!   verbatim in the digest.
//! - Larger value payloads are stored by hash.
//!
//! Hash input is the payload prefixed with its length as a little-endian
//! `u64`, so two different-length payloads can never collide under naive
//! concatenation. Index and value hashes of byte-identical content stay
//! distinguishable purely via the digest tag.

pub mod digest;

pub use digest::{
    compute_commit_id, compute_digest, compute_digest_with_threshold, content_hash,
    INLINE_THRESHOLD,
};
