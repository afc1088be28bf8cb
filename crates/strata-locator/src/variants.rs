//! The built-in locatable resource variants.

use std::sync::Arc;

use strata_error::{Result, StrataError};
use strata_types::{
    CatalogRecord, Namespace, ResourceConfig, ResourceTypeTag, Timestamp,
};

use crate::context::FederationContext;
use crate::resource::{LocatableResource, MutableResource, ResourceBase};

macro_rules! delegate_locatable {
    () => {
        fn namespace(&self) -> &Namespace {
            self.base.namespace()
        }

        fn container_namespace(&self) -> Option<&Namespace> {
            self.base.container_namespace()
        }

        fn timestamp(&self) -> Timestamp {
            self.base.timestamp()
        }

        fn type_tag(&self) -> &ResourceTypeTag {
            self.base.type_tag()
        }

        fn config(&self) -> ResourceConfig {
            self.base.config()
        }

        fn container(&self) -> Result<Option<Arc<dyn LocatableResource>>> {
            self.base.resolve_container()
        }
    };
}

/// A journal-backed mutable relation view.
///
/// The live variant: its backing journal absorbs writes, and successive
/// commit times name successive revisions of its indices.
#[derive(Debug)]
pub struct RelationResource {
    base: ResourceBase,
}

impl RelationResource {
    /// Registry tag for this variant.
    pub const TAG: &'static str = "relation";

    /// The tag as a typed value.
    #[must_use]
    pub fn type_tag() -> ResourceTypeTag {
        ResourceTypeTag::from_static(Self::TAG)
    }

    /// Construct an instance directly, ahead of `create()`.
    #[must_use]
    pub fn new(
        context: Arc<FederationContext>,
        namespace: Namespace,
        timestamp: Timestamp,
        config: ResourceConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            base: ResourceBase::new(context, namespace, timestamp, config, Self::type_tag()),
        })
    }

    /// Registry constructor.
    pub fn from_record(
        base: ResourceBase,
        _record: &CatalogRecord,
    ) -> Result<Arc<dyn LocatableResource>> {
        Ok(Arc::new(Self { base }))
    }
}

impl LocatableResource for RelationResource {
    delegate_locatable!();
}

impl MutableResource for RelationResource {
    fn create(self: Arc<Self>) -> Result<CatalogRecord> {
        let instance: Arc<dyn LocatableResource> = self.clone();
        self.base.create(instance)
    }

    fn destroy(&self) -> Result<()> {
        self.base.destroy()
    }
}

/// A read-only index-segment view of a historical commit point.
#[derive(Debug)]
pub struct SegmentResource {
    base: ResourceBase,
}

impl SegmentResource {
    /// Registry tag for this variant.
    pub const TAG: &'static str = "segment";

    /// The tag as a typed value.
    #[must_use]
    pub fn type_tag() -> ResourceTypeTag {
        ResourceTypeTag::from_static(Self::TAG)
    }

    /// Construct an instance directly, ahead of `create()`.
    ///
    /// A segment names a historical commit point; constructing one
    /// against the unisolated or read-committed view is rejected.
    pub fn new(
        context: Arc<FederationContext>,
        namespace: Namespace,
        timestamp: Timestamp,
        config: ResourceConfig,
    ) -> Result<Arc<Self>> {
        Self::check_timestamp(&namespace, timestamp)?;
        Ok(Arc::new(Self {
            base: ResourceBase::new(context, namespace, timestamp, config, Self::type_tag()),
        }))
    }

    /// Registry constructor.
    pub fn from_record(
        base: ResourceBase,
        _record: &CatalogRecord,
    ) -> Result<Arc<dyn LocatableResource>> {
        Self::check_timestamp(base.namespace(), base.timestamp())?;
        Ok(Arc::new(Self { base }))
    }

    fn check_timestamp(namespace: &Namespace, timestamp: Timestamp) -> Result<()> {
        if !timestamp.is_historical() {
            return Err(StrataError::corrupt_record(
                namespace.as_str(),
                "index segment view requires a historical timestamp",
            ));
        }
        Ok(())
    }
}

impl LocatableResource for SegmentResource {
    delegate_locatable!();

    fn is_read_only(&self) -> bool {
        true
    }
}

impl MutableResource for SegmentResource {
    fn create(self: Arc<Self>) -> Result<CatalogRecord> {
        let instance: Arc<dyn LocatableResource> = self.clone();
        self.base.create(instance)
    }

    fn destroy(&self) -> Result<()> {
        self.base.destroy()
    }
}

/// A pure namespace grouping node: the parent side of the container
/// hierarchy, with no backing storage of its own.
#[derive(Debug)]
pub struct ContainerResource {
    base: ResourceBase,
}

impl ContainerResource {
    /// Registry tag for this variant.
    pub const TAG: &'static str = "container";

    /// The tag as a typed value.
    #[must_use]
    pub fn type_tag() -> ResourceTypeTag {
        ResourceTypeTag::from_static(Self::TAG)
    }

    /// Construct an instance directly, ahead of `create()`.
    #[must_use]
    pub fn new(
        context: Arc<FederationContext>,
        namespace: Namespace,
        timestamp: Timestamp,
        config: ResourceConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            base: ResourceBase::new(context, namespace, timestamp, config, Self::type_tag()),
        })
    }

    /// Registry constructor.
    pub fn from_record(
        base: ResourceBase,
        _record: &CatalogRecord,
    ) -> Result<Arc<dyn LocatableResource>> {
        Ok(Arc::new(Self { base }))
    }
}

impl LocatableResource for ContainerResource {
    delegate_locatable!();
}

impl MutableResource for ContainerResource {
    fn create(self: Arc<Self>) -> Result<CatalogRecord> {
        let instance: Arc<dyn LocatableResource> = self.clone();
        self.base.create(instance)
    }

    fn destroy(&self) -> Result<()> {
        self.base.destroy()
    }
}
