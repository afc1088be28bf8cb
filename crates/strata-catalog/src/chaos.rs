//! Fault injection for the row-store seam.
//!
//! Wraps an inner [`RowStore`] with per-operation failure toggles so tests
//! can exercise the documented failure semantics, e.g. that a locator
//! cache hit needs no catalog round trip even when the store is down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use strata_error::{Result, StrataError};
use strata_types::PropertyMap;
use tracing::debug;

use crate::store::{CatalogSchema, RowStore};

/// A [`RowStore`] wrapper with switchable per-operation failures and
/// operation counters.
pub struct FaultInjectedRowStore {
    inner: Arc<dyn RowStore>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl FaultInjectedRowStore {
    /// Wrap `inner` with all faults disabled.
    #[must_use]
    pub fn new(inner: Arc<dyn RowStore>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Toggle read failures.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Toggle write failures.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Toggle delete failures.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Fail every operation.
    pub fn fail_all(&self, fail: bool) {
        self.fail_reads(fail);
        self.fail_writes(fail);
        self.fail_deletes(fail);
    }

    /// Number of read attempts observed (including failed ones).
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write attempts observed.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of delete attempts observed.
    #[must_use]
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl RowStore for FaultInjectedRowStore {
    fn read(&self, schema: &CatalogSchema, key: &str) -> Result<Option<PropertyMap>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            debug!(schema = %schema, key, "injected read failure");
            return Err(StrataError::catalog_io("injected read failure"));
        }
        self.inner.read(schema, key)
    }

    fn write(&self, schema: &CatalogSchema, map: PropertyMap) -> Result<PropertyMap> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            debug!(schema = %schema, "injected write failure");
            return Err(StrataError::catalog_io("injected write failure"));
        }
        self.inner.write(schema, map)
    }

    fn delete(&self, schema: &CatalogSchema, key: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            debug!(schema = %schema, key, "injected delete failure");
            return Err(StrataError::catalog_io("injected delete failure"));
        }
        self.inner.delete(schema, key)
    }
}
