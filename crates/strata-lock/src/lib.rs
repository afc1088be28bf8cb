//! Namespace-scoped exclusive locks guarding structural mutation.
//!
//! [`LockService`] is the seam to the federation's lock service; the
//! remote transport is an external collaborator. [`InProcessLockService`]
//! is the single-process implementation used by tests and embedded
//! deployments. Contention policy (queueing, fairness) lives behind the
//! service; the client contract is one blocking acquire call paired with a
//! guaranteed release.
//!
//! The service handle is obtained through a [`LockServiceSource`]: on a
//! freshly joined node the service may not be reachable yet, so a lookup
//! can yield nothing until the service comes up. [`LockServiceSlot`] is
//! the production source (a handle installed when the service starts);
//! [`FlakyLockService`] is the test source that stays empty for a fixed
//! number of lookups.
//!
//! Deliberately NOT here: deadlock detection, lock escalation, leases and
//! lease renewal. The create/destroy protocol needs only acquire-with-
//! retry followed by an unconditional release.

pub mod in_process;

pub use in_process::InProcessLockService;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;
use strata_error::Result;
use strata_types::Namespace;

/// A held exclusive lock on one namespace.
///
/// Callers MUST release on every exit path; there is no lease or timeout,
/// so an unreleased lock blocks the namespace indefinitely.
pub trait ResourceLock: fmt::Debug + Send + Sync {
    /// The namespace this lock guards.
    fn namespace(&self) -> &Namespace;

    /// Release the lock. An I/O failure talking to the lock service
    /// surfaces as [`StrataError::LockIo`]; releasing an already-released
    /// lock is a no-op.
    ///
    /// [`StrataError::LockIo`]: strata_error::StrataError::LockIo
    fn unlock(&self) -> Result<()>;
}

/// The federation lock service.
///
/// `acquire_exclusive` blocks until the namespace lock is granted or the
/// call fails with an I/O error. Retry on *contention* is the service's
/// concern, not the caller's.
pub trait LockService: fmt::Debug + Send + Sync {
    /// Acquire the exclusive lock for `namespace`, blocking until granted.
    fn acquire_exclusive(&self, namespace: &Namespace) -> Result<Box<dyn ResourceLock>>;
}

/// Dynamic lookup of the lock service handle.
///
/// A lookup yielding `None` means the service is transiently unreachable;
/// the caller decides how long to keep probing.
pub trait LockServiceSource: Send + Sync {
    /// The current lock service handle, if reachable.
    fn lock_service(&self) -> Option<Arc<dyn LockService>>;
}

/// The production [`LockServiceSource`]: a slot that starts empty and has
/// the handle installed once the service is up.
#[derive(Default)]
pub struct LockServiceSlot {
    slot: RwLock<Option<Arc<dyn LockService>>>,
}

impl LockServiceSlot {
    /// An empty slot: every lookup yields `None` until [`install`] is
    /// called.
    ///
    /// [`install`]: LockServiceSlot::install
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot with the handle already installed.
    #[must_use]
    pub fn with_service(service: Arc<dyn LockService>) -> Self {
        Self {
            slot: RwLock::new(Some(service)),
        }
    }

    /// Install (or replace) the handle.
    pub fn install(&self, service: Arc<dyn LockService>) {
        *self.slot.write() = Some(service);
    }
}

impl LockServiceSource for LockServiceSlot {
    fn lock_service(&self) -> Option<Arc<dyn LockService>> {
        self.slot.read().clone()
    }
}

impl fmt::Debug for LockServiceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockServiceSlot")
            .field("installed", &self.slot.read().is_some())
            .finish()
    }
}

/// [`LockServiceSource`] double whose first `unavailable_lookups` lookups
/// yield `None` before the inner service becomes reachable.
///
/// Drives the bounded-probe protocol in tests: a service that appears
/// only on the Nth probe, or never within the probe budget.
pub struct FlakyLockService {
    inner: Arc<dyn LockService>,
    unavailable_lookups: u32,
    lookups: AtomicU32,
}

impl FlakyLockService {
    /// Wrap `inner`, hiding it for the first `unavailable_lookups`
    /// lookups.
    #[must_use]
    pub fn new(inner: Arc<dyn LockService>, unavailable_lookups: u32) -> Self {
        Self {
            inner,
            unavailable_lookups,
            lookups: AtomicU32::new(0),
        }
    }

    /// Number of lookups observed so far.
    #[must_use]
    pub fn lookup_count(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl LockServiceSource for FlakyLockService {
    fn lock_service(&self) -> Option<Arc<dyn LockService>> {
        let nth = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        if nth <= self.unavailable_lookups {
            None
        } else {
            Some(Arc::clone(&self.inner))
        }
    }
}

impl fmt::Debug for FlakyLockService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakyLockService")
            .field("unavailable_lookups", &self.unavailable_lookups)
            .field("lookups", &self.lookup_count())
            .finish_non_exhaustive()
    }
}

/// [`LockService`] decorator counting acquire calls.
///
/// Used to assert that a failed service probe makes no lock-service call
/// at all.
pub struct CountingLockService {
    inner: Arc<dyn LockService>,
    acquires: AtomicU64,
}

impl CountingLockService {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn LockService>) -> Self {
        Self {
            inner,
            acquires: AtomicU64::new(0),
        }
    }

    /// Number of acquire calls observed.
    #[must_use]
    pub fn acquire_count(&self) -> u64 {
        self.acquires.load(Ordering::SeqCst)
    }
}

impl LockService for CountingLockService {
    fn acquire_exclusive(&self, namespace: &Namespace) -> Result<Box<dyn ResourceLock>> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire_exclusive(namespace)
    }
}

impl fmt::Debug for CountingLockService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingLockService")
            .field("acquires", &self.acquire_count())
            .finish_non_exhaustive()
    }
}
