//! Single-process lock service over a table of per-namespace gates.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};
use strata_error::Result;
use strata_types::Namespace;
use tracing::debug;

use crate::{LockService, ResourceLock};

/// One gate per namespace: a locked flag plus a condvar for waiters.
///
/// Gates are never removed from the table; the set of structurally mutated
/// namespaces in one process is small and bounded by the catalog.
struct NamespaceGate {
    locked: Mutex<bool>,
    unlocked: Condvar,
}

impl NamespaceGate {
    fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            unlocked: Condvar::new(),
        }
    }

    /// Block until the gate is free, then take it.
    fn acquire(&self) {
        let mut locked = self.locked.lock();
        while *locked {
            self.unlocked.wait(&mut locked);
        }
        *locked = true;
    }

    fn release(&self) {
        let mut locked = self.locked.lock();
        *locked = false;
        self.unlocked.notify_one();
    }
}

/// In-process [`LockService`]: exclusive per-namespace gates.
///
/// The local stand-in for the remote federation lock service. Acquire
/// blocks the calling thread until the namespace is free; grants are
/// handed to waiters one at a time.
#[derive(Default)]
pub struct InProcessLockService {
    gates: Mutex<HashMap<Namespace, Arc<NamespaceGate>>>,
}

impl InProcessLockService {
    /// Create a lock service with no held locks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self, namespace: &Namespace) -> Arc<NamespaceGate> {
        let mut gates = self.gates.lock();
        Arc::clone(
            gates
                .entry(namespace.clone())
                .or_insert_with(|| Arc::new(NamespaceGate::new())),
        )
    }

    /// True iff the namespace lock is currently held.
    #[must_use]
    pub fn is_locked(&self, namespace: &Namespace) -> bool {
        let gates = self.gates.lock();
        gates.get(namespace).is_some_and(|gate| *gate.locked.lock())
    }
}

impl fmt::Debug for InProcessLockService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessLockService")
            .field("gates", &self.gates.lock().len())
            .finish()
    }
}

impl LockService for InProcessLockService {
    fn acquire_exclusive(&self, namespace: &Namespace) -> Result<Box<dyn ResourceLock>> {
        let gate = self.gate(namespace);
        gate.acquire();
        debug!(namespace = %namespace, "exclusive lock acquired");
        Ok(Box::new(InProcessLock {
            namespace: namespace.clone(),
            gate,
            released: AtomicBool::new(false),
        }))
    }
}

/// A held in-process lock. Releasing twice is a no-op.
struct InProcessLock {
    namespace: Namespace,
    gate: Arc<NamespaceGate>,
    released: AtomicBool,
}

impl fmt::Debug for InProcessLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessLock")
            .field("namespace", &self.namespace)
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ResourceLock for InProcessLock {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn unlock(&self) -> Result<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.gate.release();
        debug!(namespace = %self.namespace, "exclusive lock released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    #[test]
    fn acquire_and_release() {
        let service = InProcessLockService::new();
        let lock = service.acquire_exclusive(&ns("ns/a")).unwrap();
        assert_eq!(lock.namespace(), &ns("ns/a"));
        assert!(service.is_locked(&ns("ns/a")));
        lock.unlock().unwrap();
        assert!(!service.is_locked(&ns("ns/a")));
    }

    #[test]
    fn unlock_is_idempotent() {
        let service = InProcessLockService::new();
        let lock = service.acquire_exclusive(&ns("ns/a")).unwrap();
        lock.unlock().unwrap();
        lock.unlock().unwrap();
        assert!(!service.is_locked(&ns("ns/a")));
    }

    #[test]
    fn distinct_namespaces_do_not_contend() {
        let service = InProcessLockService::new();
        let a = service.acquire_exclusive(&ns("ns/a")).unwrap();
        let b = service.acquire_exclusive(&ns("ns/b")).unwrap();
        a.unlock().unwrap();
        b.unlock().unwrap();
    }

    #[test]
    fn second_acquire_blocks_until_release() {
        let service = Arc::new(InProcessLockService::new());
        let lock = service.acquire_exclusive(&ns("ns/a")).unwrap();

        let service2 = Arc::clone(&service);
        let waiter = thread::spawn(move || {
            let lock = service2.acquire_exclusive(&ns("ns/a")).unwrap();
            lock.unlock().unwrap();
        });

        // Give the waiter time to block on the gate before releasing.
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        lock.unlock().unwrap();
        waiter.join().unwrap();
        assert!(!service.is_locked(&ns("ns/a")));
    }

    #[test]
    fn mutual_exclusion_under_contention() {
        let service = Arc::new(InProcessLockService::new());
        let counter = Arc::new(Mutex::new(0_u32));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let lock = service.acquire_exclusive(&ns("ns/hot")).unwrap();
                    {
                        let mut count = counter.lock();
                        *count += 1;
                    }
                    lock.unlock().unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock(), 400);
        assert!(!service.is_locked(&ns("ns/hot")));
    }
}
