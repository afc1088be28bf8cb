//! strata: resource catalog and concurrency control for a scale-out
//! storage federation.
//!
//! This umbrella crate re-exports the public surface of the workspace:
//!
//! - [`strata_types`]: namespaces, timestamps, resource metadata, catalog
//!   records.
//! - [`strata_error`]: the error taxonomy.
//! - [`strata_catalog`]: the shared row-store seam and the typed catalog
//!   adapter.
//! - [`strata_lock`]: namespace-scoped exclusive locks.
//! - [`strata_locator`]: the caching resource locator, resource variants,
//!   and the create/destroy lifecycle.
//! - [`strata_nexus`]: the serializable execution-context factory.

pub use strata_catalog::{
    CatalogStore, FaultInjectedRowStore, MemoryRowStore, RELATION_SCHEMA, RowStore,
};
pub use strata_error::{Result, StrataError};
pub use strata_lock::{
    CountingLockService, FlakyLockService, InProcessLockService, LockService, LockServiceSlot,
    LockServiceSource, ResourceLock,
};
pub use strata_locator::{
    ContainerResource, FederationContext, FederationContextBuilder, LOCK_SERVICE_PROBE_ATTEMPTS,
    LOCK_SERVICE_PROBE_DELAY, LocatableResource, MutableResource, RelationResource,
    ResourceLocator, ResourceTypeRegistry, SegmentResource,
};
pub use strata_nexus::{ExecutionNexus, ExecutionOptions, NexusDescriptor};
pub use strata_types::{
    CatalogRecord, Namespace, PropertyMap, ResourceConfig, ResourceKind, ResourceMetadata,
    ResourceState, ResourceTypeTag, Timestamp, keys,
};
