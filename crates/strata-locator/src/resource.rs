//! Shared identity and lifecycle for locatable resources.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_error::Result;
use strata_types::{CatalogRecord, Namespace, ResourceConfig, ResourceTypeTag, Timestamp};
use tracing::{debug, info};

use crate::context::FederationContext;

/// A live resource resolved from the catalog: a named relation view, an
/// index-segment view, or a namespace container.
///
/// Identity (namespace, timestamp, type tag) is immutable for the life of
/// the instance. Instances are normally constructed by the locator; the
/// one exception is an application constructing an instance directly in
/// order to `create()` it.
pub trait LocatableResource: fmt::Debug + Send + Sync {
    /// The globally unique logical name.
    fn namespace(&self) -> &Namespace;

    /// The optional parent namespace, as read from the configuration at
    /// construction.
    fn container_namespace(&self) -> Option<&Namespace>;

    /// The commit-time view this instance was constructed for.
    fn timestamp(&self) -> Timestamp;

    /// The registry tag of the concrete implementation.
    fn type_tag(&self) -> &ResourceTypeTag;

    /// The configuration captured at construction (defensively cloned).
    fn config(&self) -> ResourceConfig;

    /// Resolve the container, or `None` if this resource has no parent.
    ///
    /// Resolution happens at most once per instance and the result is
    /// memoized, including a `None` outcome; the binding does not change
    /// afterwards even if the underlying catalog record does.
    fn container(&self) -> Result<Option<Arc<dyn LocatableResource>>>;

    /// True iff this view never accepts writes.
    fn is_read_only(&self) -> bool {
        false
    }
}

/// Structural mutation of a namespace.
///
/// Callers MUST hold the namespace's exclusive lock across either call;
/// see [`FederationContext::with_exclusive_lock`]. Nothing here checks.
pub trait MutableResource: LocatableResource {
    /// Persist this resource's catalog record and register the instance
    /// in the locator cache.
    ///
    /// Unconditionally overwrites any existing record for the namespace
    /// (last-write-wins upsert); "create iff absent" is the caller's
    /// protocol if needed. Returns the record as stored.
    fn create(self: Arc<Self>) -> Result<CatalogRecord>;

    /// Delete this resource's catalog record.
    ///
    /// Does NOT evict any locator cache, including this process's own:
    /// previously resolved instances and cache entries go stale and must
    /// not be reused for further structural operations.
    fn destroy(&self) -> Result<()>;
}

/// The shared state behind every resource variant.
pub struct ResourceBase {
    context: Arc<FederationContext>,
    namespace: Namespace,
    container_namespace: Option<Namespace>,
    timestamp: Timestamp,
    type_tag: ResourceTypeTag,
    config: ResourceConfig,
    /// Resolve-once memo: `None` = unresolved, `Some(outcome)` = resolved.
    /// Held across the resolving locate so concurrent first callers wait
    /// for the single resolution in flight.
    container: Mutex<Option<Option<Arc<dyn LocatableResource>>>>,
}

impl ResourceBase {
    /// Capture identity and configuration for one resource instance.
    pub fn new(
        context: Arc<FederationContext>,
        namespace: Namespace,
        timestamp: Timestamp,
        config: ResourceConfig,
        type_tag: ResourceTypeTag,
    ) -> Self {
        let container_namespace = config.container.clone();
        info!(
            namespace = %namespace,
            %timestamp,
            container = container_namespace.as_ref().map(Namespace::as_str),
            tag = %type_tag,
            "resource constructed"
        );
        Self {
            context,
            namespace,
            container_namespace,
            timestamp,
            type_tag,
            config,
            container: Mutex::new(None),
        }
    }

    /// The process context this resource resolves through.
    #[must_use]
    pub fn context(&self) -> &Arc<FederationContext> {
        &self.context
    }

    /// The resource's namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The optional parent namespace.
    #[must_use]
    pub fn container_namespace(&self) -> Option<&Namespace> {
        self.container_namespace.as_ref()
    }

    /// The view timestamp this instance was constructed for.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The registry tag of the concrete implementation.
    #[must_use]
    pub fn type_tag(&self) -> &ResourceTypeTag {
        &self.type_tag
    }

    /// The captured configuration, defensively cloned.
    #[must_use]
    pub fn config(&self) -> ResourceConfig {
        self.config.clone()
    }

    /// Resolve the container at most once, memoizing the outcome.
    pub fn resolve_container(&self) -> Result<Option<Arc<dyn LocatableResource>>> {
        let mut memo = self.container.lock();
        if let Some(resolved) = memo.as_ref() {
            return Ok(resolved.clone());
        }
        let resolved = match &self.container_namespace {
            Some(container_ns) => {
                debug!(
                    namespace = %self.namespace,
                    container = %container_ns,
                    "resolving container"
                );
                self.context.locate(container_ns, self.timestamp)?
            }
            None => None,
        };
        *memo = Some(resolved.clone());
        Ok(resolved)
    }

    /// The create() lifecycle step shared by every mutable variant.
    ///
    /// Builds the catalog record from this instance's own identity —
    /// the reserved namespace and class keys always reflect `self`, never
    /// caller-supplied map entries — writes it through the catalog store,
    /// and registers `instance` in the locator cache so the creating call
    /// site observes its own write without a catalog round trip.
    pub(crate) fn create(&self, instance: Arc<dyn LocatableResource>) -> Result<CatalogRecord> {
        info!(namespace = %self.namespace, tag = %self.type_tag, "create");
        let record = CatalogRecord {
            namespace: self.namespace.clone(),
            type_tag: self.type_tag.clone(),
            config: self.config.clone(),
        };
        let applied = self.context.catalog().write(&record)?;
        self.context.locator().put_instance(instance);
        Ok(applied)
    }

    /// The destroy() lifecycle step: remove the catalog record.
    pub(crate) fn destroy(&self) -> Result<()> {
        info!(namespace = %self.namespace, tag = %self.type_tag, "destroy");
        self.context.catalog().delete(&self.namespace)
    }
}

impl fmt::Debug for ResourceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBase")
            .field("namespace", &self.namespace)
            .field("container_namespace", &self.container_namespace)
            .field("timestamp", &self.timestamp)
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}
