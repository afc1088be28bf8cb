//! Resource location and structural-mutation control for the federation.
//!
//! The pieces, leaves first:
//!
//! - [`ResourceBase`] / [`LocatableResource`]: identity and memoized
//!   container resolution shared by every resource variant.
//! - [`ResourceTypeRegistry`]: type tag to constructor, populated at
//!   process start; resolves the concrete variant named by a catalog
//!   record without reflection.
//! - [`ResourceLocator`]: the per-process (namespace, timestamp) cache,
//!   with the catalog store as ground truth on miss.
//! - [`FederationContext`]: the process-scoped dependency context wiring
//!   catalog store, lock-service slot, registry, and locator together,
//!   and the exclusive-lock acquisition protocol with bounded probe
//!   retry.
//!
//! Structural mutation (create/destroy of a namespace) is valid only
//! while the caller holds the namespace's exclusive lock. That discipline
//! is a call-site convention, enforced by every lifecycle call site in
//! this workspace but not by the resources themselves.

pub mod context;
pub mod locator;
pub mod registry;
pub mod resource;
pub mod variants;

pub use context::{
    FederationContext, FederationContextBuilder, LOCK_SERVICE_PROBE_ATTEMPTS,
    LOCK_SERVICE_PROBE_DELAY,
};
pub use locator::ResourceLocator;
pub use registry::{ResourceCtor, ResourceTypeRegistry};
pub use resource::{LocatableResource, MutableResource, ResourceBase};
pub use variants::{ContainerResource, RelationResource, SegmentResource};
