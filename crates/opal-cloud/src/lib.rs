//! Cloud path derivation for Opal.
//!
//! Maps `{user_id, app_id, page_id}` onto the remote key spaces of the two
//! supported backends. All functions are total, deterministic, and free of
//! I/O; paths are never stored locally, only recomputed on demand.
//!
//! The exact segment order, separators, and [`STORAGE_VERSION`] are a
//! wire-compatibility surface: changing any of them writes to a key space
//! disjoint from previously uploaded data, so any change requires a version
//! bump.

pub mod encoding;
pub mod paths;

pub use encoding::{can_be_verbatim, decode_segment, encode_segment};
pub use paths::{
    flat_prefix_for_app, flat_prefix_for_page, path_for_app, path_for_page, path_for_user,
    DEFAULT_PREFIX, FLAT_SEPARATOR, STORAGE_VERSION,
};
