//! Type-tag registry resolving catalog records to concrete variants.
//!
//! A record's class field names an implementation by tag; the registry
//! maps tags to constructor functions, populated at process start. This
//! keeps polymorphic resolution over the variant set without any runtime
//! reflection.

use std::collections::HashMap;
use std::sync::Arc;

use strata_error::{Result, StrataError};
use strata_types::{CatalogRecord, ResourceTypeTag};

use crate::resource::{LocatableResource, ResourceBase};
use crate::variants::{ContainerResource, RelationResource, SegmentResource};

/// Constructor for one resource variant.
///
/// Receives the prepared [`ResourceBase`] plus the full record, so a
/// variant can validate or pull additional configuration.
pub type ResourceCtor = fn(ResourceBase, &CatalogRecord) -> Result<Arc<dyn LocatableResource>>;

/// Registry of resource constructors keyed by type tag.
#[derive(Default)]
pub struct ResourceTypeRegistry {
    ctors: HashMap<ResourceTypeTag, ResourceCtor>,
}

impl ResourceTypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in variants registered: `relation`,
    /// `segment`, and `container`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        // Fresh registry, literal tags: registration cannot collide.
        let _ = registry.register(RelationResource::type_tag(), RelationResource::from_record);
        let _ = registry.register(SegmentResource::type_tag(), SegmentResource::from_record);
        let _ = registry.register(ContainerResource::type_tag(), ContainerResource::from_record);
        registry
    }

    /// Register a constructor for `tag`.
    ///
    /// Rejects duplicate tags: two implementations claiming the same tag
    /// would make catalog records ambiguous.
    pub fn register(&mut self, tag: ResourceTypeTag, ctor: ResourceCtor) -> Result<()> {
        if self.ctors.contains_key(&tag) {
            return Err(StrataError::internal(format!(
                "resource type tag '{tag}' registered twice"
            )));
        }
        self.ctors.insert(tag, ctor);
        Ok(())
    }

    /// Whether a constructor is registered for `tag`.
    #[must_use]
    pub fn is_registered(&self, tag: &ResourceTypeTag) -> bool {
        self.ctors.contains_key(tag)
    }

    /// Construct the variant named by `record`.
    pub fn construct(
        &self,
        record: &CatalogRecord,
        base: ResourceBase,
    ) -> Result<Arc<dyn LocatableResource>> {
        let ctor = self
            .ctors
            .get(&record.type_tag)
            .ok_or_else(|| StrataError::UnknownResourceType {
                tag: record.type_tag.as_str().to_owned(),
            })?;
        ctor(base, record)
    }
}

impl std::fmt::Debug for ResourceTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.ctors.keys().map(ResourceTypeTag::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ResourceTypeRegistry")
            .field("tags", &tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = ResourceTypeRegistry::with_builtins();
        assert!(registry.is_registered(&RelationResource::type_tag()));
        assert!(registry.is_registered(&SegmentResource::type_tag()));
        assert!(registry.is_registered(&ContainerResource::type_tag()));
        assert!(!registry.is_registered(&ResourceTypeTag::new("no-such-type").unwrap()));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ResourceTypeRegistry::with_builtins();
        let err = registry
            .register(RelationResource::type_tag(), RelationResource::from_record)
            .unwrap_err();
        assert!(matches!(err, StrataError::Internal(_)));
    }
}
