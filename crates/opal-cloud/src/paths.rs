//! Backend-specific remote key derivations.
//!
//! Both backends share the same segment order — prefix, user, storage
//! version, app, page — and differ only in how segments are joined. The
//! hierarchical backend uses `/` structurally; the flat backend's object
//! names are plain strings, so the separator there is the literal
//! three-character token [`FLAT_SEPARATOR`], which no encoded segment can
//! contain.

use crate::encoding::encode_segment;

/// Root namespace shared by every Opal installation.
pub const DEFAULT_PREFIX: &str = "opal";

/// Version of the remote layout. Bumped on any breaking change to segment
/// order, separators, or encodings, so new data never collides with data
/// written under the previous layout.
pub const STORAGE_VERSION: &str = "v1";

/// Separator token of the flat-namespace backend: an escaped `/` with an
/// uppercase hex digit, which `encode_segment` can never emit.
pub const FLAT_SEPARATOR: &str = "%2F";

/// Hierarchical path rooting all of one user's data.
pub fn path_for_user(user_id: &str) -> String {
    format!(
        "{}/{}/{}",
        encode_segment(DEFAULT_PREFIX),
        encode_segment(user_id),
        STORAGE_VERSION
    )
}

/// Hierarchical path rooting one app's data within a user.
pub fn path_for_app(user_id: &str, app_id: &str) -> String {
    format!("{}/{}", path_for_user(user_id), encode_segment(app_id))
}

/// Hierarchical path rooting one page's data within an app.
pub fn path_for_page(user_id: &str, app_id: &str, page_id: &str) -> String {
    format!(
        "{}/{}",
        path_for_app(user_id, app_id),
        encode_segment(page_id)
    )
}

/// Flat-namespace key prefix for one app's objects.
pub fn flat_prefix_for_app(user_id: &str, app_id: &str) -> String {
    [
        encode_segment(DEFAULT_PREFIX),
        encode_segment(user_id),
        STORAGE_VERSION.to_string(),
        encode_segment(app_id),
    ]
    .join(FLAT_SEPARATOR)
}

/// Flat-namespace key prefix for one page's objects. Ends with the
/// separator so object names append directly.
pub fn flat_prefix_for_page(user_id: &str, app_id: &str, page_id: &str) -> String {
    format!(
        "{}{}{}{}",
        flat_prefix_for_app(user_id, app_id),
        FLAT_SEPARATOR,
        encode_segment(page_id),
        FLAT_SEPARATOR
    )
}
