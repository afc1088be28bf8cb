//! The shared catalog store: single source of truth for "what resource
//! exists under this namespace".
//!
//! [`RowStore`] is the seam to the shared row-oriented store; the store's
//! own concurrency engine is an external collaborator. [`CatalogStore`]
//! adapts it to typed [`CatalogRecord`] operations keyed by namespace.
//! [`MemoryRowStore`] is the in-process implementation backing tests and
//! single-node deployments; [`FaultInjectedRowStore`] wraps any store with
//! per-operation failure toggles.

pub mod adapter;
pub mod chaos;
pub mod store;

pub use adapter::{CatalogStore, RELATION_SCHEMA};
pub use chaos::FaultInjectedRowStore;
pub use store::{CatalogSchema, MemoryRowStore, RowStore};
