use thiserror::Error;

/// Errors produced by Opal storage operations.
///
/// This is the single taxonomy shared by every layer: row decoding, the
/// page database factory, and cancellable operations all resolve to one of
/// these. Variants carry owned strings rather than source errors so that a
/// single failure (for example a failed database open) can be cloned and
/// fanned out to every coalesced waiter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The requested row or object does not exist.
    #[error("not found")]
    NotFound,

    /// The underlying storage engine failed to open, read, or write.
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored data could not be decoded. Continuing with a misparsed row
    /// risks corrupting the commit DAG, so this is never downgraded.
    #[error("corrupt data: {0}")]
    Corruption(String),

    /// A malformed key, journal id, or digest was supplied.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A duplicate head or commit insertion was attempted outside the
    /// intended atomic path.
    #[error("already exists")]
    AlreadyExists,

    /// The operation was canceled before it completed.
    #[error("canceled")]
    Cancelled,

    /// An invariant this layer is supposed to guarantee was found violated.
    /// Fatal to the affected operation; surfaced loudly, never swallowed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result alias for Opal storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_cloneable_for_fanout() {
        let err = StorageError::Io("disk on fire".into());
        let copy = err.clone();
        assert_eq!(err, copy);
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(msg) if msg.contains("boom")));
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(StorageError::NotFound.to_string(), "not found");
        assert_eq!(
            StorageError::InvalidArgument("bad tag".into()).to_string(),
            "invalid argument: bad tag"
        );
    }
}
