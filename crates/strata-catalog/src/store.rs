//! Row-store seam and the in-process implementation.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use strata_error::Result;
use strata_types::PropertyMap;

/// Names a row-store schema and the field holding its primary key.
///
/// The catalog layer uses a single schema whose primary key is the
/// namespace; other subsystems sharing the row store declare their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogSchema {
    name: &'static str,
    primary_key: &'static str,
}

impl CatalogSchema {
    /// Define a schema.
    #[must_use]
    pub const fn new(name: &'static str, primary_key: &'static str) -> Self {
        Self { name, primary_key }
    }

    /// The schema name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The field holding the primary key.
    #[inline]
    #[must_use]
    pub const fn primary_key(&self) -> &'static str {
        self.primary_key
    }
}

impl fmt::Display for CatalogSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The shared row-oriented store.
///
/// One property-map record per (schema, key). Writes are last-write-wins
/// per key; no atomicity is provided across keys. Implementations must be
/// safe for concurrent use from many threads and, in a federation, many
/// processes.
pub trait RowStore: Send + Sync {
    /// Read the record for `key`, or `None` if absent.
    fn read(&self, schema: &CatalogSchema, key: &str) -> Result<Option<PropertyMap>>;

    /// Write `map` under its primary key, replacing any prior record.
    ///
    /// Returns the map actually stored, which may echo back fields the
    /// store assigned or normalized.
    fn write(&self, schema: &CatalogSchema, map: PropertyMap) -> Result<PropertyMap>;

    /// Delete the record for `key`. Deleting an absent key is not an
    /// error.
    fn delete(&self, schema: &CatalogSchema, key: &str) -> Result<()>;
}

/// In-process [`RowStore`] over a `HashMap` behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    records: RwLock<HashMap<(&'static str, String), PropertyMap>>,
}

impl MemoryRowStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored across all schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True iff no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RowStore for MemoryRowStore {
    fn read(&self, schema: &CatalogSchema, key: &str) -> Result<Option<PropertyMap>> {
        Ok(self
            .records
            .read()
            .get(&(schema.name(), key.to_owned()))
            .cloned())
    }

    fn write(&self, schema: &CatalogSchema, map: PropertyMap) -> Result<PropertyMap> {
        let key = map
            .get(schema.primary_key())
            .cloned()
            .ok_or_else(|| {
                strata_error::StrataError::catalog_io(format!(
                    "record for schema '{}' has no primary key field '{}'",
                    schema.name(),
                    schema.primary_key()
                ))
            })?;
        self.records
            .write()
            .insert((schema.name(), key), map.clone());
        Ok(map)
    }

    fn delete(&self, schema: &CatalogSchema, key: &str) -> Result<()> {
        self.records.write().remove(&(schema.name(), key.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: CatalogSchema = CatalogSchema::new("relation", "strata.namespace");

    fn map_for(ns: &str) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert("strata.namespace".to_owned(), ns.to_owned());
        map.insert("strata.class".to_owned(), "relation".to_owned());
        map
    }

    #[test]
    fn write_then_read() {
        let store = MemoryRowStore::new();
        let applied = store.write(&SCHEMA, map_for("ns/a")).unwrap();
        assert_eq!(applied, map_for("ns/a"));
        assert_eq!(store.read(&SCHEMA, "ns/a").unwrap(), Some(map_for("ns/a")));
        assert_eq!(store.read(&SCHEMA, "ns/b").unwrap(), None);
    }

    #[test]
    fn write_is_last_write_wins() {
        let store = MemoryRowStore::new();
        store.write(&SCHEMA, map_for("ns/a")).unwrap();
        let mut second = map_for("ns/a");
        second.insert("extra".to_owned(), "1".to_owned());
        store.write(&SCHEMA, second.clone()).unwrap();
        assert_eq!(store.read(&SCHEMA, "ns/a").unwrap(), Some(second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryRowStore::new();
        store.write(&SCHEMA, map_for("ns/a")).unwrap();
        store.delete(&SCHEMA, "ns/a").unwrap();
        assert_eq!(store.read(&SCHEMA, "ns/a").unwrap(), None);
        // Absent key: still fine.
        store.delete(&SCHEMA, "ns/a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn write_without_primary_key_is_an_error() {
        let store = MemoryRowStore::new();
        let mut map = PropertyMap::new();
        map.insert("unrelated".to_owned(), "x".to_owned());
        assert!(store.write(&SCHEMA, map).is_err());
    }

    #[test]
    fn schemas_are_disjoint() {
        const OTHER: CatalogSchema = CatalogSchema::new("other", "strata.namespace");
        let store = MemoryRowStore::new();
        store.write(&SCHEMA, map_for("ns/a")).unwrap();
        assert_eq!(store.read(&OTHER, "ns/a").unwrap(), None);
    }
}
