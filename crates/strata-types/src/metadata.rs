//! Metadata describing one physical storage resource.
//!
//! The storage engine emits these records from journal root blocks and
//! index-segment checkpoints; this crate only defines the value shape and
//! its identity semantics.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Timestamp;

/// The kind of physical file backing a resource.
///
/// Exactly one of the two kinds applies to any resource: a journal absorbs
/// live writes for one or more index partitions, while an index segment
/// holds immutable historical data for exactly one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Append-only mutable store absorbing live writes.
    Journal,
    /// Immutable read-only store built from a historical view.
    IndexSegment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Journal => f.write_str("journal"),
            Self::IndexSegment => f.write_str("index-segment"),
        }
    }
}

/// Life cycle state of a physical store file.
///
/// The state is monotonic: once `Deleted`, a resource never leaves that
/// state, and a `ReadOnly` resource never becomes writable again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceState {
    /// Live and accepting reads (and writes, for a journal).
    Normal,
    /// Sealed against further writes.
    ReadOnly,
    /// Logically deleted; the file may be reclaimed.
    Deleted,
}

impl ResourceState {
    /// Whether a transition from `self` to `next` preserves monotonicity.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Deleted, Self::Deleted) => true,
            (Self::Deleted, _) => false,
            (Self::ReadOnly, Self::Normal) => false,
            _ => true,
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::ReadOnly => f.write_str("read-only"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

/// Immutable descriptor of one physical storage file.
///
/// `commit_time` disambiguates which revision of a logical index this
/// record names: for a journal-backed revision it is the commit time of
/// the revision of interest, for an index segment it is the commit time
/// of the view the segment was built from.
///
/// Equality and hashing are keyed on `uuid` ONLY. Two records naming the
/// same physical resource compare equal even when `size` or `state`
/// differ, so metadata can serve as a set key while the underlying file
/// mutates in place (a journal grows as it absorbs writes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Journal or index segment.
    pub kind: ResourceKind,
    /// Name of the file containing the resource.
    pub file: String,
    /// Size of the store file in bytes.
    pub size: u64,
    /// Life cycle state of the store file.
    pub state: ResourceState,
    /// Stable identity for the life of the physical file.
    pub uuid: Uuid,
    /// Commit time of the described index revision.
    pub commit_time: Timestamp,
}

impl ResourceMetadata {
    /// True iff this resource is a journal.
    #[inline]
    #[must_use]
    pub fn is_journal(&self) -> bool {
        self.kind == ResourceKind::Journal
    }

    /// True iff this resource is an index segment.
    #[inline]
    #[must_use]
    pub fn is_index_segment(&self) -> bool {
        self.kind == ResourceKind::IndexSegment
    }
}

impl PartialEq for ResourceMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for ResourceMetadata {}

impl Hash for ResourceMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl fmt::Display for ResourceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{file={}, size={}, state={}, uuid={}, commitTime={}}}",
            self.kind, self.file, self.size, self.state, self.uuid, self.commit_time
        )
    }
}
