//! The persisted catalog record and its typed in-memory view.
//!
//! The shared row store holds one flat string-to-string property map per
//! namespace. Inside the process we work with [`CatalogRecord`]; the flat
//! map only exists at the catalog-store boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Namespace;

/// The flat property map persisted in the shared row store.
pub type PropertyMap = BTreeMap<String, String>;

/// Reserved keys of the catalog record layout.
///
/// `NAMESPACE` and `CLASS` are always overwritten on create with the
/// instance's own identity; `CONTAINER` is read-only after construction.
/// All other keys are implementation-specific configuration carried
/// opaquely.
pub mod keys {
    /// The namespace the record is keyed by.
    pub const NAMESPACE: &str = "strata.namespace";
    /// The type tag naming the concrete resource implementation.
    pub const CLASS: &str = "strata.class";
    /// Optional parent namespace.
    pub const CONTAINER: &str = "strata.container";
}

/// A registry tag naming a concrete [`LocatableResource`] implementation.
///
/// Stored in the catalog record under [`keys::CLASS`] and resolved through
/// the process-local type registry, replacing instantiation by class name.
///
/// [`LocatableResource`]: https://docs.rs/strata-locator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTypeTag(String);

impl ResourceTypeTag {
    /// Create a type tag. Returns `None` if `tag` is empty.
    pub fn new(tag: impl Into<String>) -> Option<Self> {
        let tag = tag.into();
        if tag.is_empty() { None } else { Some(Self(tag)) }
    }

    /// Create a type tag from a literal. `tag` must be non-empty.
    ///
    /// Intended for the compile-time tags of built-in resource variants;
    /// runtime strings go through [`ResourceTypeTag::new`].
    #[must_use]
    pub fn from_static(tag: &'static str) -> Self {
        debug_assert!(!tag.is_empty());
        Self(tag.to_owned())
    }

    /// The tag as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration captured when a resource is constructed.
///
/// `container` is the optional parent namespace; `extra` carries every
/// non-reserved key of the property map opaquely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Optional parent namespace.
    pub container: Option<Namespace>,
    /// Open extension fields, opaque to the catalog layer.
    pub extra: BTreeMap<String, String>,
}

impl ResourceConfig {
    /// Configuration with a parent namespace and no extension fields.
    #[must_use]
    pub fn with_container(container: Namespace) -> Self {
        Self {
            container: Some(container),
            extra: BTreeMap::new(),
        }
    }

    /// Look up an extension field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// The typed view of one persisted catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// The namespace the record is keyed by.
    pub namespace: Namespace,
    /// Tag of the concrete resource implementation.
    pub type_tag: ResourceTypeTag,
    /// Everything else.
    pub config: ResourceConfig,
}

impl CatalogRecord {
    /// Flatten to the property map persisted in the row store.
    ///
    /// Reserved keys always win over same-named extension fields, so a
    /// config map cannot lie about the record's identity.
    #[must_use]
    pub fn to_map(&self) -> PropertyMap {
        let mut map = self.config.extra.clone();
        if let Some(container) = &self.config.container {
            map.insert(keys::CONTAINER.to_owned(), container.as_str().to_owned());
        }
        map.insert(keys::NAMESPACE.to_owned(), self.namespace.as_str().to_owned());
        map.insert(keys::CLASS.to_owned(), self.type_tag.as_str().to_owned());
        map
    }

    /// Parse a property map read back from the row store.
    pub fn from_map(map: &PropertyMap) -> Result<Self, RecordError> {
        let namespace = map
            .get(keys::NAMESPACE)
            .ok_or(RecordError::MissingKey(keys::NAMESPACE))?;
        let namespace =
            Namespace::new(namespace.clone()).ok_or(RecordError::MissingKey(keys::NAMESPACE))?;
        let type_tag = map
            .get(keys::CLASS)
            .ok_or(RecordError::MissingKey(keys::CLASS))?;
        let type_tag =
            ResourceTypeTag::new(type_tag.clone()).ok_or(RecordError::MissingKey(keys::CLASS))?;
        let container = match map.get(keys::CONTAINER) {
            Some(val) => Some(Namespace::new(val.clone()).ok_or(RecordError::EmptyContainer)?),
            None => None,
        };
        let extra = map
            .iter()
            .filter(|(k, _)| {
                k.as_str() != keys::NAMESPACE
                    && k.as_str() != keys::CLASS
                    && k.as_str() != keys::CONTAINER
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self {
            namespace,
            type_tag,
            config: ResourceConfig { container, extra },
        })
    }
}

/// Error parsing a property map into a [`CatalogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// A reserved key is absent or empty.
    MissingKey(&'static str),
    /// The container key is present but empty.
    EmptyContainer,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(key) => write!(f, "catalog record missing required key '{key}'"),
            Self::EmptyContainer => f.write_str("catalog record has an empty container namespace"),
        }
    }
}

impl std::error::Error for RecordError {}
