use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use nna_core::{
    AssetNamingService, BuiltinSnapshotSource, FileSnapshotSource, InMemorySequenceAllocator,
    NamingServiceError, RegistryCache, SequenceAllocator, SequencePath, SqliteSequenceAllocator,
    TaxonomyError, TaxonomySnapshot, TaxonomySource, TaxonomyTree, TaxonomyVersion,
};

fn sqlite_service(db_path: &std::path::Path) -> AssetNamingService<SqliteSequenceAllocator> {
    let cache = RegistryCache::from_source(&BuiltinSnapshotSource).unwrap();
    AssetNamingService::new(
        Arc::new(cache),
        SqliteSequenceAllocator::open(db_path).unwrap(),
    )
}

/// Builtin data at `version`; even versions move `S.POP.HPM` to numeric 009.
fn renumbered_snapshot(version: u64) -> TaxonomySnapshot {
    let mut snapshot = BuiltinSnapshotSource.load_snapshot().unwrap();
    snapshot.version = TaxonomyVersion(version);
    if version % 2 == 0 {
        let hpm = snapshot
            .layers
            .iter_mut()
            .find(|layer| layer.code == "S")
            .and_then(|layer| {
                layer
                    .categories
                    .iter_mut()
                    .find(|category| category.code.as_deref() == Some("POP"))
            })
            .and_then(|category| {
                category
                    .subcategories
                    .iter_mut()
                    .find(|subcategory| subcategory.code.as_deref() == Some("HPM"))
            })
            .unwrap();
        hpm.numeric_code = Some(9);
    }
    snapshot
}

fn expected_hpm_prefix(version: TaxonomyVersion) -> &'static str {
    if version.0 % 2 == 0 {
        "2.001.009."
    } else {
        "2.001.007."
    }
}

#[test]
fn registrations_continue_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("registry.db");

    {
        let service = sqlite_service(&db_path);
        let first = service.register("G", "POP", "BAS", Some("mp3")).unwrap();
        let second = service.register("Songs", "Pop", "Base", None).unwrap();
        assert_eq!(first.hfn, "G.POP.BAS.001.mp3");
        assert_eq!(first.mfa, "1.001.001.001.mp3");
        assert_eq!(second.hfn, "G.POP.BAS.002");
        assert_eq!(second.taxonomy_version, TaxonomyVersion(1));
    }

    let service = sqlite_service(&db_path);
    let preview = service.preview("1", "001", "001", None).unwrap();
    assert_eq!(preview.to_hfn(), "G.POP.BAS.003");
    assert_eq!(
        service
            .allocator()
            .issued_values(&SequencePath::new("G", "POP", "BAS"))
            .unwrap(),
        vec![1, 2]
    );
}

#[test]
fn synthesized_category_registers_and_converts() {
    let dir = tempfile::tempdir().unwrap();
    let service = sqlite_service(&dir.path().join("registry.db"));

    let asset = service
        .register("L", "Dance Couture", "Street_Style", None)
        .unwrap();
    assert_eq!(asset.hfn, "L.DAC.STS.001");
    assert_eq!(asset.mfa, "3.002.002.001");
    assert_eq!(service.to_hfn(&asset.mfa).unwrap(), asset.hfn);
    assert_eq!(service.to_mfa(&asset.hfn).unwrap(), asset.mfa);
}

#[test]
fn reload_swaps_taxonomy_but_keeps_counters() {
    let dir = tempfile::tempdir().unwrap();
    let service = sqlite_service(&dir.path().join("registry.db"));
    service.register("W", "BCH", "SUN", None).unwrap();

    let mut snapshot = BuiltinSnapshotSource.load_snapshot().unwrap();
    snapshot.version = TaxonomyVersion(2);
    let taxonomy_path = dir.path().join("taxonomy-v2.json");
    std::fs::write(&taxonomy_path, snapshot.to_json_string().unwrap()).unwrap();

    let replaced = service
        .reload(&FileSnapshotSource::new(&taxonomy_path))
        .unwrap();
    assert_eq!(replaced, TaxonomyVersion(1));

    let asset = service.register("W", "BCH", "SUN", None).unwrap();
    assert_eq!(asset.hfn, "W.BCH.SUN.002");
    assert_eq!(asset.taxonomy_version, TaxonomyVersion(2));
}

#[test]
fn ambiguous_partial_name_is_reported_with_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let service = sqlite_service(&dir.path().join("registry.db"));

    let err = service.resolve_path("S", "POP", "Legend").unwrap_err();
    match err {
        NamingServiceError::Taxonomy(TaxonomyError::AmbiguousName { candidates, .. }) => {
            assert!(candidates.len() >= 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.allocator().counters().unwrap().is_empty());
}

#[test]
fn renumbered_subcategory_applies_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let service = sqlite_service(&dir.path().join("registry.db"));
    let before = service.register("S", "POP", "HPM", None).unwrap();
    assert_eq!(before.mfa, "2.001.007.001");

    let taxonomy_path = dir.path().join("taxonomy-v2.json");
    std::fs::write(
        &taxonomy_path,
        renumbered_snapshot(2).to_json_string().unwrap(),
    )
    .unwrap();
    service
        .reload(&FileSnapshotSource::new(&taxonomy_path))
        .unwrap();

    let after = service.register("S", "POP", "hipster", None).unwrap();
    assert_eq!(after.taxonomy_version, TaxonomyVersion(2));
    assert_eq!(after.hfn, "S.POP.HPM.002");
    assert_eq!(after.mfa, "2.001.009.002");
}

#[test]
fn registered_version_matches_addresses_during_swaps() {
    let tree = TaxonomyTree::from_snapshot(&renumbered_snapshot(1)).unwrap();
    let service = Arc::new(AssetNamingService::new(
        Arc::new(RegistryCache::new(tree)),
        InMemorySequenceAllocator::new(),
    ));

    let done = Arc::new(AtomicBool::new(false));
    let writers = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let asset = service.register("S", "POP", "HPM", None).unwrap();
                    assert!(
                        asset
                            .mfa
                            .starts_with(expected_hpm_prefix(asset.taxonomy_version)),
                        "{} labelled {}",
                        asset.mfa,
                        asset.taxonomy_version
                    );
                }
            })
        })
        .collect::<Vec<_>>();

    for version in 2..=200 {
        let tree = TaxonomyTree::from_snapshot(&renumbered_snapshot(version)).unwrap();
        service.cache().invalidate(tree).unwrap();
    }
    done.store(true, Ordering::Release);

    for writer in writers {
        writer.join().unwrap();
    }
    assert_eq!(service.cache().version(), TaxonomyVersion(200));
}
