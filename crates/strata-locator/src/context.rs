//! The process-scoped federation context and the exclusive-lock protocol.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use strata_catalog::CatalogStore;
use strata_error::{Result, StrataError};
use strata_lock::{LockService, LockServiceSlot, LockServiceSource, ResourceLock};
use strata_types::{Namespace, Timestamp};
use tracing::{debug, warn};

use crate::locator::ResourceLocator;
use crate::registry::ResourceTypeRegistry;
use crate::resource::LocatableResource;

/// Bounded number of lock-service handle probes before giving up.
pub const LOCK_SERVICE_PROBE_ATTEMPTS: u32 = 3;

/// Delay between lock-service handle probes.
pub const LOCK_SERVICE_PROBE_DELAY: Duration = Duration::from_millis(10);

/// Probe `lookup` until it yields a lock-service handle, up to `attempts`
/// probes spaced `delay` apart.
///
/// The lock service may not yet be reachable on a freshly joined node;
/// this bounds how long a structural operation waits for it to appear.
/// No lock-service call is made on failure.
fn probe_lock_service<F>(
    mut lookup: F,
    attempts: u32,
    delay: Duration,
) -> Result<Arc<dyn LockService>>
where
    F: FnMut() -> Option<Arc<dyn LockService>>,
{
    for attempt in 1..=attempts {
        if let Some(service) = lookup() {
            return Ok(service);
        }
        if attempt < attempts {
            debug!(attempt, "lock service unavailable, will retry");
            thread::sleep(delay);
        }
    }
    Err(StrataError::LockServiceUnavailable { attempts })
}

/// Releases a held lock when dropped, so an unwinding caller cannot leave
/// the namespace locked.
struct ReleaseOnDrop {
    lock: Option<Box<dyn ResourceLock>>,
}

impl ReleaseOnDrop {
    fn new(lock: Box<dyn ResourceLock>) -> Self {
        Self { lock: Some(lock) }
    }

    fn as_lock(&self) -> &dyn ResourceLock {
        // Present until release() consumes the guard.
        match self.lock.as_deref() {
            Some(lock) => lock,
            None => unreachable!("lock guard already released"),
        }
    }

    /// Release eagerly, surfacing the release error to the caller.
    fn release(mut self) -> Result<()> {
        match self.lock.take() {
            Some(lock) => lock.unlock(),
            None => Ok(()),
        }
    }
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            if let Err(error) = lock.unlock() {
                warn!(
                    namespace = %lock.namespace(),
                    %error,
                    "lock release failed during unwind"
                );
            }
        }
    }
}

/// Builder for [`FederationContext`].
#[derive(Default)]
pub struct FederationContextBuilder {
    catalog: Option<CatalogStore>,
    lock_source: Option<Arc<dyn LockServiceSource>>,
    registry: Option<ResourceTypeRegistry>,
}

impl FederationContextBuilder {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog store adapter (required).
    #[must_use]
    pub fn catalog(mut self, catalog: CatalogStore) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// A lock service that is already up, wrapped in a pre-filled slot.
    #[must_use]
    pub fn lock_service(self, service: Arc<dyn LockService>) -> Self {
        self.lock_service_source(Arc::new(LockServiceSlot::with_service(service)))
    }

    /// The lock-service source. Defaults to an empty [`LockServiceSlot`]:
    /// every lookup fails until a handle is installed, which the probe
    /// protocol tolerates transiently.
    #[must_use]
    pub fn lock_service_source(mut self, source: Arc<dyn LockServiceSource>) -> Self {
        self.lock_source = Some(source);
        self
    }

    /// The resource type registry (defaults to the built-in variants).
    #[must_use]
    pub fn registry(mut self, registry: ResourceTypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the context.
    ///
    /// A missing catalog store is a fatal construction error; a missing
    /// lock service is tolerated transiently.
    pub fn build(self) -> Result<Arc<FederationContext>> {
        let catalog = self.catalog.ok_or(StrataError::MissingArgument {
            what: "catalog store",
        })?;
        Ok(Arc::new(FederationContext {
            catalog,
            lock_source: self
                .lock_source
                .unwrap_or_else(|| Arc::new(LockServiceSlot::new())),
            registry: self.registry.unwrap_or_else(ResourceTypeRegistry::with_builtins),
            locator: ResourceLocator::new(),
        }))
    }
}

/// Process-scoped dependency context: the catalog store, the lock-service
/// source, the type registry, and the locator cache.
///
/// One context per process (or per embedded federation client). Resources
/// hold an `Arc` of their context; the context's locator caches the
/// resources. That cycle mirrors the ownership shape of the federation
/// handle and is accepted for process-scoped singletons.
pub struct FederationContext {
    catalog: CatalogStore,
    lock_source: Arc<dyn LockServiceSource>,
    registry: ResourceTypeRegistry,
    locator: ResourceLocator,
}

impl FederationContext {
    /// Start building a context.
    #[must_use]
    pub fn builder() -> FederationContextBuilder {
        FederationContextBuilder::new()
    }

    /// The catalog store adapter.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// The locator cache.
    #[must_use]
    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// The resource type registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceTypeRegistry {
        &self.registry
    }

    /// One lock-service lookup through the source, if currently
    /// reachable.
    #[must_use]
    pub fn lock_service(&self) -> Option<Arc<dyn LockService>> {
        self.lock_source.lock_service()
    }

    /// Resolve `namespace` as of `timestamp` through the locator cache.
    pub fn locate(
        self: &Arc<Self>,
        namespace: &Namespace,
        timestamp: Timestamp,
    ) -> Result<Option<Arc<dyn LocatableResource>>> {
        self.locator.locate(self, namespace, timestamp)
    }

    /// Acquire the exclusive lock for `namespace`.
    ///
    /// Probes the lock-service source up to [`LOCK_SERVICE_PROBE_ATTEMPTS`]
    /// times spaced [`LOCK_SERVICE_PROBE_DELAY`] apart; if the handle
    /// never appears, fails with
    /// [`StrataError::LockServiceUnavailable`] without any lock-service
    /// call. Once the handle is obtained, a single blocking acquire is
    /// made; an I/O failure from that call surfaces unretried — retry on
    /// *contention* belongs to the lock service, not this client.
    pub fn acquire_exclusive_lock(&self, namespace: &Namespace) -> Result<Box<dyn ResourceLock>> {
        let service = probe_lock_service(
            || self.lock_source.lock_service(),
            LOCK_SERVICE_PROBE_ATTEMPTS,
            LOCK_SERVICE_PROBE_DELAY,
        )?;
        service.acquire_exclusive(namespace)
    }

    /// Release `lock`. An I/O failure surfaces as a fatal error.
    pub fn unlock(&self, lock: Box<dyn ResourceLock>) -> Result<()> {
        lock.unlock()
    }

    /// Run `f` while holding the exclusive lock for `namespace`,
    /// releasing on every exit path, a panic in `f` included.
    ///
    /// This is the consistency unit for structural mutation: acquire,
    /// create/destroy, release. When both the body and the release fail,
    /// the body's error wins and the release failure is logged.
    pub fn with_exclusive_lock<T>(
        &self,
        namespace: &Namespace,
        f: impl FnOnce(&dyn ResourceLock) -> Result<T>,
    ) -> Result<T> {
        let guard = ReleaseOnDrop::new(self.acquire_exclusive_lock(namespace)?);
        let outcome = f(guard.as_lock());
        let released = guard.release();
        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release_err)) => Err(release_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(
                    namespace = %namespace,
                    error = %release_err,
                    "lock release failed after operation error"
                );
                Err(err)
            }
        }
    }
}

impl fmt::Debug for FederationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederationContext")
            .field("catalog", &self.catalog)
            .field("registry", &self.registry)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use strata_catalog::MemoryRowStore;
    use strata_lock::{CountingLockService, FlakyLockService, InProcessLockService};

    use super::*;

    fn context_with_source(source: Arc<dyn LockServiceSource>) -> Arc<FederationContext> {
        FederationContext::builder()
            .catalog(CatalogStore::new(Arc::new(MemoryRowStore::new())))
            .lock_service_source(source)
            .build()
            .unwrap()
    }

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    #[test]
    fn builder_requires_catalog() {
        let err = FederationContext::builder().build().unwrap_err();
        assert!(matches!(
            err,
            StrataError::MissingArgument {
                what: "catalog store"
            }
        ));
    }

    #[test]
    fn probe_succeeds_on_third_attempt() {
        let service: Arc<dyn LockService> = Arc::new(InProcessLockService::new());
        let calls = AtomicU32::new(0);
        let resolved = probe_lock_service(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { None } else { Some(Arc::clone(&service)) }
            },
            LOCK_SERVICE_PROBE_ATTEMPTS,
            Duration::from_millis(1),
        );
        assert!(resolved.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn probe_fails_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let err = probe_lock_service(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            },
            LOCK_SERVICE_PROBE_ATTEMPTS,
            Duration::from_millis(1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StrataError::LockServiceUnavailable { attempts: 3 }
        ));
        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unavailable_service_means_no_acquire_call() {
        let counting = Arc::new(CountingLockService::new(Arc::new(
            InProcessLockService::new(),
        )));
        // The service exists but stays unreachable past the probe budget.
        let flaky = Arc::new(FlakyLockService::new(
            Arc::clone(&counting) as Arc<dyn LockService>,
            LOCK_SERVICE_PROBE_ATTEMPTS,
        ));
        let ctx = context_with_source(Arc::clone(&flaky) as Arc<dyn LockServiceSource>);

        let err = ctx.acquire_exclusive_lock(&ns("ns/a")).unwrap_err();
        assert!(matches!(err, StrataError::LockServiceUnavailable { .. }));
        assert_eq!(flaky.lookup_count(), LOCK_SERVICE_PROBE_ATTEMPTS);
        assert_eq!(counting.acquire_count(), 0);
    }

    #[test]
    fn service_appearing_on_final_probe_is_used() {
        let counting = Arc::new(CountingLockService::new(Arc::new(
            InProcessLockService::new(),
        )));
        let flaky = Arc::new(FlakyLockService::new(
            Arc::clone(&counting) as Arc<dyn LockService>,
            LOCK_SERVICE_PROBE_ATTEMPTS - 1,
        ));
        let ctx = context_with_source(Arc::clone(&flaky) as Arc<dyn LockServiceSource>);

        let lock = ctx.acquire_exclusive_lock(&ns("ns/a")).unwrap();
        assert_eq!(flaky.lookup_count(), LOCK_SERVICE_PROBE_ATTEMPTS);
        assert_eq!(counting.acquire_count(), 1);
        assert_eq!(lock.namespace(), &ns("ns/a"));
        ctx.unlock(lock).unwrap();
    }

    #[test]
    fn acquire_goes_through_service_installed_later() {
        let slot = Arc::new(LockServiceSlot::new());
        let ctx = context_with_source(Arc::clone(&slot) as Arc<dyn LockServiceSource>);

        let err = ctx.acquire_exclusive_lock(&ns("ns/a")).unwrap_err();
        assert!(matches!(err, StrataError::LockServiceUnavailable { .. }));

        let counting = Arc::new(CountingLockService::new(Arc::new(
            InProcessLockService::new(),
        )));
        slot.install(Arc::clone(&counting) as Arc<dyn LockService>);

        let lock = ctx.acquire_exclusive_lock(&ns("ns/a")).unwrap();
        assert_eq!(counting.acquire_count(), 1);
        assert_eq!(lock.namespace(), &ns("ns/a"));
        ctx.unlock(lock).unwrap();
    }

    #[test]
    fn with_exclusive_lock_releases_on_success_and_failure() {
        let service = Arc::new(InProcessLockService::new());
        let ctx = context_with_source(Arc::new(LockServiceSlot::with_service(
            Arc::clone(&service) as Arc<dyn LockService>,
        )));

        let out = ctx
            .with_exclusive_lock(&ns("ns/a"), |lock| {
                assert_eq!(lock.namespace(), &ns("ns/a"));
                Ok(42)
            })
            .unwrap();
        assert_eq!(out, 42);
        assert!(!service.is_locked(&ns("ns/a")));

        let err = ctx
            .with_exclusive_lock(&ns("ns/a"), |_| -> Result<()> {
                Err(StrataError::internal("business failure"))
            })
            .unwrap_err();
        assert!(matches!(err, StrataError::Internal(_)));
        // Released despite the body error.
        assert!(!service.is_locked(&ns("ns/a")));
    }

    #[test]
    fn with_exclusive_lock_releases_when_the_body_panics() {
        let service = Arc::new(InProcessLockService::new());
        let ctx = context_with_source(Arc::new(LockServiceSlot::with_service(
            Arc::clone(&service) as Arc<dyn LockService>,
        )));

        let unwound = catch_unwind(AssertUnwindSafe(|| {
            let _ = ctx.with_exclusive_lock(&ns("ns/a"), |_| -> Result<()> {
                panic!("structural operation blew up mid-flight")
            });
        }));
        assert!(unwound.is_err());
        assert!(!service.is_locked(&ns("ns/a")));

        // The namespace is immediately acquirable again.
        let lock = ctx.acquire_exclusive_lock(&ns("ns/a")).unwrap();
        lock.unlock().unwrap();
    }
}
