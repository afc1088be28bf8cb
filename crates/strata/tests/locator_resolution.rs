//! Namespace resolution: cache behavior, container hierarchy, registry
//! dispatch, and the end-to-end scenario.

use std::sync::Arc;
use std::thread;

use strata::{
    CatalogRecord, CatalogStore, ContainerResource, FaultInjectedRowStore, FederationContext,
    InProcessLockService, LocatableResource, LockService, MemoryRowStore, MutableResource,
    Namespace, RelationResource, ResourceConfig, ResourceTypeTag, RowStore, SegmentResource,
    StrataError, Timestamp,
};

fn ns(name: &str) -> Namespace {
    Namespace::new(name).unwrap()
}

fn build_context(
    backing: Arc<MemoryRowStore>,
) -> (Arc<FederationContext>, Arc<FaultInjectedRowStore>) {
    let faulty = Arc::new(FaultInjectedRowStore::new(backing));
    let ctx = FederationContext::builder()
        .catalog(CatalogStore::new(
            Arc::clone(&faulty) as Arc<dyn RowStore>
        ))
        .lock_service(Arc::new(InProcessLockService::new()) as Arc<dyn LockService>)
        .build()
        .unwrap();
    (ctx, faulty)
}

#[test]
fn repeated_locate_returns_the_same_instance() {
    let (ctx, faulty) = build_context(Arc::new(MemoryRowStore::new()));
    let ts = Timestamp::new(5);
    RelationResource::new(Arc::clone(&ctx), ns("ns/a"), ts, ResourceConfig::default())
        .create()
        .unwrap();

    let first = ctx.locate(&ns("ns/a"), ts).unwrap().unwrap();
    let second = ctx.locate(&ns("ns/a"), ts).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // One write from create, zero reads: both locates were cache hits.
    assert_eq!(faulty.write_count(), 1);
    assert_eq!(faulty.read_count(), 0);
}

#[test]
fn distinct_timestamps_are_distinct_cache_entries() {
    let (ctx, faulty) = build_context(Arc::new(MemoryRowStore::new()));
    RelationResource::new(
        Arc::clone(&ctx),
        ns("ns/a"),
        Timestamp::new(5),
        ResourceConfig::default(),
    )
    .create()
    .unwrap();

    let at5 = ctx.locate(&ns("ns/a"), Timestamp::new(5)).unwrap().unwrap();
    let at9 = ctx.locate(&ns("ns/a"), Timestamp::new(9)).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&at5, &at9));
    assert_eq!(at9.timestamp(), Timestamp::new(9));
    // The second view required one catalog read.
    assert_eq!(faulty.read_count(), 1);
    assert_eq!(ctx.locator().len(), 2);
}

#[test]
fn container_resolution_is_memoized() {
    let (ctx, faulty) = build_context(Arc::new(MemoryRowStore::new()));
    let ts = Timestamp::new(100);

    ContainerResource::new(
        Arc::clone(&ctx),
        ns("ns/root"),
        ts,
        ResourceConfig::default(),
    )
    .create()
    .unwrap();
    RelationResource::new(
        Arc::clone(&ctx),
        ns("ns/a"),
        ts,
        ResourceConfig::with_container(ns("ns/root")),
    )
    .create()
    .unwrap();

    let child = ctx.locate(&ns("ns/a"), ts).unwrap().unwrap();
    assert_eq!(child.container_namespace(), Some(&ns("ns/root")));

    let first = child.container().unwrap().unwrap();
    let second = child.container().unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.namespace(), &ns("ns/root"));

    // Both creates primed the cache, so resolving the container took no
    // catalog read at all, and certainly not one per call.
    assert_eq!(faulty.read_count(), 0);
}

#[test]
fn concurrent_first_container_access_resolves_once() {
    let backing = Arc::new(MemoryRowStore::new());
    {
        // Prime the catalog from a throwaway context.
        let (setup, _) = build_context(Arc::clone(&backing));
        ContainerResource::new(
            Arc::clone(&setup),
            ns("ns/root"),
            Timestamp::new(1),
            ResourceConfig::default(),
        )
        .create()
        .unwrap();
        RelationResource::new(
            Arc::clone(&setup),
            ns("ns/a"),
            Timestamp::new(1),
            ResourceConfig::with_container(ns("ns/root")),
        )
        .create()
        .unwrap();
    }

    let (ctx, faulty) = build_context(backing);
    let child = ctx.locate(&ns("ns/a"), Timestamp::new(1)).unwrap().unwrap();
    assert_eq!(faulty.read_count(), 1);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let child = Arc::clone(&child);
        handles.push(thread::spawn(move || {
            child.container().unwrap().unwrap()
        }));
    }
    let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for pair in resolved.windows(2) {
        assert!(Arc::ptr_eq(&pair[0], &pair[1]));
    }

    // Exactly one additional read: the single container resolution.
    assert_eq!(faulty.read_count(), 2);
}

#[test]
fn resource_without_container_memoizes_none() {
    let (ctx, _) = build_context(Arc::new(MemoryRowStore::new()));
    let relation = RelationResource::new(
        Arc::clone(&ctx),
        ns("ns/a"),
        Timestamp::UNISOLATED,
        ResourceConfig::default(),
    );
    Arc::clone(&relation).create().unwrap();
    assert!(relation.container().unwrap().is_none());
    assert!(relation.container().unwrap().is_none());
}

#[test]
fn unknown_type_tag_is_an_error_not_absent() {
    let (ctx, _) = build_context(Arc::new(MemoryRowStore::new()));
    let record = CatalogRecord {
        namespace: ns("ns/exotic"),
        type_tag: ResourceTypeTag::new("holographic-index").unwrap(),
        config: ResourceConfig::default(),
    };
    ctx.catalog().write(&record).unwrap();

    let err = ctx
        .locate(&ns("ns/exotic"), Timestamp::UNISOLATED)
        .unwrap_err();
    assert!(matches!(
        err,
        StrataError::UnknownResourceType { tag } if tag == "holographic-index"
    ));
}

#[test]
fn segment_resolves_historically_but_only_historically() {
    let (ctx, _) = build_context(Arc::new(MemoryRowStore::new()));
    SegmentResource::new(
        Arc::clone(&ctx),
        ns("ns/seg"),
        Timestamp::new(50),
        ResourceConfig::default(),
    )
    .unwrap()
    .create()
    .unwrap();

    let seg = ctx.locate(&ns("ns/seg"), Timestamp::new(50)).unwrap().unwrap();
    assert!(seg.is_read_only());

    // Both non-historical views name a moving commit point, which a
    // segment cannot back.
    for ts in [Timestamp::UNISOLATED, Timestamp::READ_COMMITTED] {
        let err = ctx.locate(&ns("ns/seg"), ts).unwrap_err();
        assert!(matches!(err, StrataError::CorruptRecord { .. }));
    }

    // Direct construction is rejected at the same seam.
    let err = SegmentResource::new(
        Arc::clone(&ctx),
        ns("ns/seg2"),
        Timestamp::READ_COMMITTED,
        ResourceConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StrataError::CorruptRecord { .. }));
}

#[test]
fn end_to_end_hierarchy_create_resolve_destroy() {
    let backing = Arc::new(MemoryRowStore::new());
    let (ctx, _) = build_context(Arc::clone(&backing));
    let ts = Timestamp::new(100);

    // Pre-existing root container.
    ctx.with_exclusive_lock(&ns("ns/root"), |_| {
        ContainerResource::new(
            Arc::clone(&ctx),
            ns("ns/root"),
            ts,
            ResourceConfig::default(),
        )
        .create()
    })
    .unwrap();

    // Create ns/A under it.
    let relation = RelationResource::new(
        Arc::clone(&ctx),
        ns("ns/A"),
        ts,
        ResourceConfig::with_container(ns("ns/root")),
    );
    ctx.with_exclusive_lock(&ns("ns/A"), |_| Arc::clone(&relation).create())
        .unwrap();

    // Resolution walks the hierarchy.
    let located = ctx.locate(&ns("ns/A"), ts).unwrap().unwrap();
    let container = located.container().unwrap().unwrap();
    assert_eq!(container.namespace(), &ns("ns/root"));

    // Destroy ns/A under its lock.
    ctx.with_exclusive_lock(&ns("ns/A"), |_| relation.destroy())
        .unwrap();
    assert!(ctx.catalog().read(&ns("ns/A")).unwrap().is_none());

    // A new context (empty cache) over the same store: ns/A is gone,
    // ns/root survives.
    let (fresh, _) = build_context(backing);
    assert!(fresh.locate(&ns("ns/A"), ts).unwrap().is_none());
    assert!(fresh.locate(&ns("ns/root"), ts).unwrap().is_some());
}
