//! Primary error type for strata catalog and lock operations.
//!
//! Structured variants for the failure taxonomy of the catalog layer.
//! "Resource not found" is deliberately NOT an error: `locate` returns
//! `Ok(None)` for a namespace with no catalog record.

use thiserror::Error;

/// Primary error type for strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    // === Construction errors ===
    /// A required constructor argument was absent.
    #[error("missing required argument: {what}")]
    MissingArgument { what: &'static str },

    // === Lock protocol errors ===
    /// The lock service handle could not be obtained within the bounded
    /// probe retry.
    #[error("lock service unreachable after {attempts} attempts")]
    LockServiceUnavailable { attempts: u32 },

    /// The lock service acquire or release call itself failed.
    #[error("lock I/O failure for namespace '{namespace}': {detail}")]
    LockIo { namespace: String, detail: String },

    /// A blocking wait was interrupted externally.
    #[error("interrupted while waiting")]
    Interrupted,

    // === Catalog store errors ===
    /// The underlying row store failed a read, write, or delete.
    #[error("catalog store I/O failure: {detail}")]
    CatalogIo { detail: String },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog record names a type tag with no registered constructor.
    #[error("no registered resource type for tag '{tag}'")]
    UnknownResourceType { tag: String },

    /// A persisted record failed the typed conversion.
    #[error("corrupt catalog record for namespace '{namespace}': {detail}")]
    CorruptRecord { namespace: String, detail: String },

    // === Internal ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl StrataError {
    /// Whether this is a transient condition that may succeed on retry at
    /// a higher level.
    ///
    /// Only the lock-service probe failure qualifies; every other variant
    /// is fatal for the attempt by design.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::LockServiceUnavailable { .. })
    }

    /// Create a catalog I/O error.
    pub fn catalog_io(detail: impl Into<String>) -> Self {
        Self::CatalogIo {
            detail: detail.into(),
        }
    }

    /// Create a lock I/O error.
    pub fn lock_io(namespace: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::LockIo {
            namespace: namespace.into(),
            detail: detail.into(),
        }
    }

    /// Create a corrupt-record error.
    pub fn corrupt_record(namespace: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CorruptRecord {
            namespace: namespace.into(),
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `StrataError`.
pub type Result<T> = std::result::Result<T, StrataError>;
