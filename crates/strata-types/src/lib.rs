//! Core value types for the strata resource catalog.
//!
//! This crate is the dependency leaf of the workspace: namespaces,
//! commit-time timestamps, physical resource metadata, and the typed view
//! of a persisted catalog record. No I/O, no locking, no behavior beyond
//! identity and conversion.

pub mod metadata;
pub mod record;

pub use metadata::{ResourceKind, ResourceMetadata, ResourceState};
pub use record::{CatalogRecord, PropertyMap, RecordError, ResourceConfig, ResourceTypeTag, keys};

use std::fmt;

use serde::{Deserialize, Serialize};

/// A globally unique logical name for a relation, index, or container
/// within the federation.
///
/// Namespaces are plain non-empty strings. The parent/child hierarchy is
/// expressed through the catalog record's container field, not through
/// any structure of the name itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Create a new namespace.
    ///
    /// Returns `None` if `name` is empty.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() { None } else { Some(Self(name)) }
    }

    /// The namespace as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Namespace {
    type Error = InvalidNamespace;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidNamespace)
    }
}

impl TryFrom<String> for Namespace {
    type Error = InvalidNamespace;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidNamespace)
    }
}

/// Error returned when attempting to create an empty `Namespace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNamespace;

impl fmt::Display for InvalidNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("namespace cannot be empty")
    }
}

impl std::error::Error for InvalidNamespace {}

/// A commit-time timestamp identifying a specific committed revision of an
/// index, or one of the conventional live views.
///
/// Positive values name historical commit points. `UNISOLATED` names the
/// live mutable view; `READ_COMMITTED` names the most recent commit point,
/// whatever it happens to be at read time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The live unisolated (read-write) view.
    pub const UNISOLATED: Self = Self(0);

    /// The most recent committed view as of the read.
    pub const READ_COMMITTED: Self = Self(-1);

    /// Create a timestamp from a raw commit time.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw commit time.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// True iff this names a fixed historical commit point.
    #[inline]
    pub const fn is_historical(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UNISOLATED => f.write_str("unisolated"),
            Self::READ_COMMITTED => f.write_str("read-committed"),
            Self(t) => write!(f, "{t}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_rejects_empty() {
        assert!(Namespace::new("").is_none());
        assert_eq!(Namespace::try_from(""), Err(InvalidNamespace));
        assert_eq!(Namespace::new("ns/a").unwrap().as_str(), "ns/a");
    }

    #[test]
    fn namespace_ordering_and_display() {
        let a = Namespace::new("ns/a").unwrap();
        let b = Namespace::new("ns/b").unwrap();
        assert!(a < b);
        assert_eq!(a.to_string(), "ns/a");
    }

    #[test]
    fn timestamp_views() {
        assert!(!Timestamp::UNISOLATED.is_historical());
        assert!(!Timestamp::READ_COMMITTED.is_historical());
        assert!(Timestamp::new(100).is_historical());
        assert_eq!(Timestamp::UNISOLATED.to_string(), "unisolated");
        assert_eq!(Timestamp::READ_COMMITTED.to_string(), "read-committed");
        assert_eq!(Timestamp::new(42).to_string(), "42");
    }

    #[test]
    fn namespace_serde_is_transparent() {
        let ns = Namespace::new("ns/root").unwrap();
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, r#""ns/root""#);
        let back: Namespace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ns);
    }

    #[test]
    fn timestamp_serde_is_transparent() {
        let ts = Timestamp::new(7);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "7");
    }
}
