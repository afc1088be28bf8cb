//! The caching resource locator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use strata_error::Result;
use strata_types::{Namespace, Timestamp};
use tracing::debug;

use crate::context::FederationContext;
use crate::resource::{LocatableResource, ResourceBase};

/// Per-process cache resolving (namespace, timestamp) to a live resource
/// instance.
///
/// A hit returns the cached instance with no catalog round trip. On miss
/// the catalog store is ground truth: absent record means the resource
/// does not exist. The cache is unbounded and never coherent across
/// processes; it is also never evicted on destroy — a context that
/// destroyed a namespace can still resolve its own stale instance.
#[derive(Default)]
pub struct ResourceLocator {
    cache: RwLock<HashMap<(Namespace, Timestamp), Arc<dyn LocatableResource>>>,
}

impl ResourceLocator {
    /// An empty locator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `namespace` as of `timestamp`.
    ///
    /// Returns `Ok(None)` when no catalog record exists for the
    /// namespace. The timestamp keys the cache and parameterizes instance
    /// construction; point-in-time metadata resolution against the
    /// physical storage engine happens at read time, not here.
    pub fn locate(
        &self,
        context: &Arc<FederationContext>,
        namespace: &Namespace,
        timestamp: Timestamp,
    ) -> Result<Option<Arc<dyn LocatableResource>>> {
        if let Some(hit) = self
            .cache
            .read()
            .get(&(namespace.clone(), timestamp))
        {
            debug!(namespace = %namespace, %timestamp, "locator cache hit");
            return Ok(Some(Arc::clone(hit)));
        }

        let Some(record) = context.catalog().read(namespace)? else {
            debug!(namespace = %namespace, "no catalog record");
            return Ok(None);
        };

        let base = ResourceBase::new(
            Arc::clone(context),
            record.namespace.clone(),
            timestamp,
            record.config.clone(),
            record.type_tag.clone(),
        );
        let instance = context.registry().construct(&record, base)?;

        let mut cache = self.cache.write();
        // A concurrent miss may have inserted first; keep that instance
        // so every caller observes the same identity.
        let entry = cache
            .entry((namespace.clone(), timestamp))
            .or_insert(instance);
        Ok(Some(Arc::clone(entry)))
    }

    /// Insert `instance` directly, bypassing catalog lookup.
    ///
    /// Used exactly once per resource, immediately after a successful
    /// `create()`, so the creating call site observes its own write.
    pub fn put_instance(&self, instance: Arc<dyn LocatableResource>) {
        let key = (instance.namespace().clone(), instance.timestamp());
        debug!(namespace = %key.0, timestamp = %key.1, "locator cache put");
        self.cache.write().insert(key, instance);
    }

    /// Whether an instance is cached for (namespace, timestamp).
    #[must_use]
    pub fn is_cached(&self, namespace: &Namespace, timestamp: Timestamp) -> bool {
        self.cache
            .read()
            .contains_key(&(namespace.clone(), timestamp))
    }

    /// Number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// True iff nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl fmt::Debug for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLocator")
            .field("cached", &self.len())
            .finish()
    }
}
