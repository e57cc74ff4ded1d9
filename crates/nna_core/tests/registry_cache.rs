use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use nna_core::taxonomy::{CategoryRecord, SubcategoryRecord};
use nna_core::{
    BuiltinSnapshotSource, CacheError, FileSnapshotSource, RegistryCache, TaxonomyError,
    TaxonomySnapshot, TaxonomySource, TaxonomyTree, TaxonomyVersion,
};

fn builtin_snapshot() -> TaxonomySnapshot {
    BuiltinSnapshotSource.load_snapshot().unwrap()
}

/// Builtin data at `version`, plus one extra Stars category `GLM` at 050.
fn extended_snapshot(version: u64) -> TaxonomySnapshot {
    let mut snapshot = builtin_snapshot();
    snapshot.version = TaxonomyVersion(version);
    let stars = snapshot
        .layers
        .iter_mut()
        .find(|layer| layer.code == "S")
        .unwrap();
    stars.categories.push(CategoryRecord {
        code: Some("GLM".to_string()),
        numeric_code: Some(50),
        name: "Glam".to_string(),
        subcategories: vec![SubcategoryRecord {
            code: Some("BAS".to_string()),
            numeric_code: Some(1),
            name: "Base".to_string(),
        }],
    });
    snapshot
}

fn category_codes(cache: &RegistryCache, layer: &str) -> Vec<String> {
    cache
        .list_categories(layer)
        .unwrap()
        .iter()
        .map(|category| category.alpha_code.clone())
        .collect()
}

#[test]
fn lookups_reflect_only_new_version_after_invalidate() {
    let cache = RegistryCache::new(TaxonomyTree::from_snapshot(&builtin_snapshot()).unwrap());
    assert!(!category_codes(&cache, "S").contains(&"GLM".to_string()));
    assert!(matches!(
        cache.to_mfa("S.GLM.BAS.001").unwrap_err(),
        TaxonomyError::NotFound { .. }
    ));
    assert!(cache.resolve_category_code("S", "Glam").is_err());

    let v2 = TaxonomyTree::from_snapshot(&extended_snapshot(2)).unwrap();
    assert_eq!(cache.invalidate(v2).unwrap(), TaxonomyVersion(1));

    assert_eq!(cache.version(), TaxonomyVersion(2));
    assert!(category_codes(&cache, "S").contains(&"GLM".to_string()));
    assert_eq!(cache.to_mfa("S.GLM.BAS.001").unwrap(), "2.050.001.001");
    assert_eq!(cache.resolve_category_code("S", "Glam").unwrap(), "GLM");
}

#[test]
fn stale_reload_keeps_active_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taxonomy.json");
    std::fs::write(&path, extended_snapshot(1).to_json_string().unwrap()).unwrap();

    let cache = RegistryCache::new(TaxonomyTree::from_snapshot(&builtin_snapshot()).unwrap());
    cache.list_categories("S").unwrap();

    let err = cache.reload(&FileSnapshotSource::new(&path)).unwrap_err();
    assert!(matches!(err, CacheError::StaleVersion { .. }));
    assert_eq!(cache.version(), TaxonomyVersion(1));
    assert_eq!(cache.stats().entries, 1);
}

#[test]
fn reload_surfaces_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"version\": 2, ").unwrap();

    let cache = RegistryCache::from_source(&BuiltinSnapshotSource).unwrap();
    let err = cache.reload(&FileSnapshotSource::new(&path)).unwrap_err();
    assert!(matches!(err, CacheError::Load(_)));
    assert_eq!(cache.version(), TaxonomyVersion(1));
}

#[test]
fn readers_never_observe_mixed_versions() {
    let v1 = TaxonomyTree::from_snapshot(&builtin_snapshot()).unwrap();
    let cache = Arc::new(RegistryCache::new(v1));
    let old_codes = category_codes(&cache, "S");
    let mut new_codes = old_codes.clone();
    new_codes.push("GLM".to_string());

    let done = Arc::new(AtomicBool::new(false));
    let readers = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            let old_codes = old_codes.clone();
            let new_codes = new_codes.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let tree = cache.tree();
                    let codes = category_codes(&cache, "S");
                    assert!(codes == old_codes || codes == new_codes);

                    let pinned: Vec<_> = tree
                        .list_categories("S")
                        .unwrap()
                        .iter()
                        .map(|category| category.alpha_code.clone())
                        .collect();
                    let expected = if tree.version().0 % 2 == 1 {
                        &old_codes
                    } else {
                        &new_codes
                    };
                    assert_eq!(&pinned, expected);
                }
            })
        })
        .collect::<Vec<_>>();

    for version in 2..=20 {
        let snapshot = if version % 2 == 0 {
            extended_snapshot(version)
        } else {
            let mut snapshot = builtin_snapshot();
            snapshot.version = TaxonomyVersion(version);
            snapshot
        };
        cache
            .invalidate(TaxonomyTree::from_snapshot(&snapshot).unwrap())
            .unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(cache.version(), TaxonomyVersion(20));
}
