//! Typed catalog-record operations over the row-store seam.

use std::fmt;
use std::sync::Arc;

use strata_error::{Result, StrataError};
use strata_types::{CatalogRecord, Namespace, keys};
use tracing::debug;

use crate::store::{CatalogSchema, RowStore};

/// The row-store schema holding catalog records, keyed by namespace.
pub const RELATION_SCHEMA: CatalogSchema = CatalogSchema::new("strata.relation", keys::NAMESPACE);

/// Adapter from typed [`CatalogRecord`] operations to the shared row
/// store.
///
/// The stringly property map exists only on the far side of this adapter;
/// everything above it works with the typed record. No atomicity across
/// namespaces: callers needing multi-namespace changes coordinate
/// externally.
#[derive(Clone)]
pub struct CatalogStore {
    store: Arc<dyn RowStore>,
    schema: CatalogSchema,
}

impl CatalogStore {
    /// Adapt `store` using the standard relation schema.
    #[must_use]
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            schema: RELATION_SCHEMA,
        }
    }

    /// The schema this adapter writes under.
    #[must_use]
    pub fn schema(&self) -> &CatalogSchema {
        &self.schema
    }

    /// Persist `record`, replacing any prior record for its namespace.
    ///
    /// Returns the record actually stored (parsed back from the map the
    /// store applied, which may echo normalized fields).
    pub fn write(&self, record: &CatalogRecord) -> Result<CatalogRecord> {
        let applied = self.store.write(&self.schema, record.to_map())?;
        debug!(namespace = %record.namespace, tag = %record.type_tag, "catalog record written");
        CatalogRecord::from_map(&applied).map_err(|err| {
            StrataError::corrupt_record(record.namespace.as_str(), err.to_string())
        })
    }

    /// Read the record for `namespace`, or `None` if no resource exists
    /// there.
    pub fn read(&self, namespace: &Namespace) -> Result<Option<CatalogRecord>> {
        let Some(map) = self.store.read(&self.schema, namespace.as_str())? else {
            return Ok(None);
        };
        let record = CatalogRecord::from_map(&map)
            .map_err(|err| StrataError::corrupt_record(namespace.as_str(), err.to_string()))?;
        Ok(Some(record))
    }

    /// Delete the record for `namespace`. Idempotent: deleting an absent
    /// namespace succeeds.
    pub fn delete(&self, namespace: &Namespace) -> Result<()> {
        self.store.delete(&self.schema, namespace.as_str())?;
        debug!(namespace = %namespace, "catalog record deleted");
        Ok(())
    }
}

impl fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogStore")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
