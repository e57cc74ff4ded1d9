//! Generation-swapped registry cache.
//!
//! Each generation pairs one immutable `TaxonomyTree` with the memo tables
//! filled while that tree was active. `invalidate` publishes a whole new
//! generation with a compare-and-swap loop, so readers never observe a tree
//! from one version next to memo entries from another.
//!
//! Memo keys are built from the folded lookup input, so inputs that differ
//! only in case or separator runs share one entry.

use super::{CacheError, CacheResult};
use crate::codec::AddressCodec;
use crate::model::address::{Address, AddressForm};
use crate::model::taxonomy::{Category, Subcategory, TaxonomyPath, TaxonomyVersion};
use crate::taxonomy::tree::lookup_key;
use crate::taxonomy::{
    canonical_category_code, canonical_subcategory_code, CodeKey, TaxonomyResult,
    TaxonomySource, TaxonomyTree,
};
use arc_swap::ArcSwap;
use log::{info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters describing the active generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub version: TaxonomyVersion,
    pub hits: u64,
    pub misses: u64,
    /// Memoized listings plus memoized code resolutions.
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MemoKey {
    Category {
        layer: String,
        input: String,
    },
    Subcategory {
        layer: String,
        category: String,
        input: String,
    },
}

struct CacheGeneration {
    tree: Arc<TaxonomyTree>,
    categories: RwLock<HashMap<String, Arc<[Category]>>>,
    subcategories: RwLock<HashMap<(String, String), Arc<[Subcategory]>>>,
    codes: RwLock<HashMap<MemoKey, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheGeneration {
    fn new(tree: Arc<TaxonomyTree>) -> Self {
        Self {
            tree,
            categories: RwLock::new(HashMap::new()),
            subcategories: RwLock::new(HashMap::new()),
            codes: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the memoized value for `key`, computing it on a miss.
    ///
    /// Errors are not memoized.
    fn memoized<K, V>(
        &self,
        table: &RwLock<HashMap<K, V>>,
        key: K,
        compute: impl FnOnce(&TaxonomyTree) -> TaxonomyResult<V>,
    ) -> TaxonomyResult<V>
    where
        K: Eq + Hash,
        V: Clone,
    {
        if let Some(value) = table.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute(&self.tree)?;
        table.write().entry(key).or_insert_with(|| value.clone());
        Ok(value)
    }

    fn category_code(&self, layer: &str, input: &str) -> TaxonomyResult<String> {
        let key = MemoKey::Category {
            layer: lookup_key(layer),
            input: lookup_key(input),
        };
        self.memoized(&self.codes, key, |tree| {
            canonical_category_code(tree, layer, input)
        })
    }

    fn subcategory_code(
        &self,
        layer: &str,
        category: &str,
        input: &str,
    ) -> TaxonomyResult<String> {
        let key = MemoKey::Subcategory {
            layer: lookup_key(layer),
            category: lookup_key(category),
            input: lookup_key(input),
        };
        self.memoized(&self.codes, key, |tree| {
            canonical_subcategory_code(tree, layer, category, input)
        })
    }

    /// Resolves a full path on this generation, going through the code memo.
    fn path(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
    ) -> TaxonomyResult<TaxonomyPath> {
        let layer_code = self.tree.lookup_layer(layer)?.alpha_code.to_string();
        let category_code = self.category_code(&layer_code, category)?;
        let subcategory_code = self.subcategory_code(&layer_code, &category_code, subcategory)?;
        self.tree.resolve_codes(
            CodeKey::Alpha(&layer_code),
            CodeKey::Alpha(&category_code),
            CodeKey::Alpha(&subcategory_code),
        )
    }

    fn entry_count(&self) -> usize {
        self.categories.read().len() + self.subcategories.read().len() + self.codes.read().len()
    }
}

/// Shared, versioned view of the taxonomy for concurrent callers.
pub struct RegistryCache {
    current: ArcSwap<CacheGeneration>,
}

impl RegistryCache {
    pub fn new(tree: TaxonomyTree) -> Self {
        Self {
            current: ArcSwap::from_pointee(CacheGeneration::new(Arc::new(tree))),
        }
    }

    /// Builds a cache from the tree currently offered by `source`.
    pub fn from_source(source: &dyn TaxonomySource) -> CacheResult<Self> {
        Ok(Self::new(source.load_tree()?))
    }

    pub fn version(&self) -> TaxonomyVersion {
        self.current.load().tree.version()
    }

    /// Active tree. Holding the returned handle pins that version.
    pub fn tree(&self) -> Arc<TaxonomyTree> {
        Arc::clone(&self.current.load().tree)
    }

    /// Categories of `layer` in declared order.
    pub fn list_categories(&self, layer: &str) -> TaxonomyResult<Arc<[Category]>> {
        let generation = self.current.load_full();
        generation.memoized(&generation.categories, lookup_key(layer), |tree| {
            Ok(Arc::from(tree.list_categories(layer)?))
        })
    }

    /// Subcategories of `(layer, category)` in declared order.
    pub fn list_subcategories(
        &self,
        layer: &str,
        category: &str,
    ) -> TaxonomyResult<Arc<[Subcategory]>> {
        let generation = self.current.load_full();
        let key = (lookup_key(layer), lookup_key(category));
        generation.memoized(&generation.subcategories, key, |tree| {
            Ok(Arc::from(tree.list_subcategories(layer, category)?))
        })
    }

    /// Canonical alphabetic category code for any accepted input form.
    pub fn resolve_category_code(&self, layer: &str, input: &str) -> TaxonomyResult<String> {
        self.current.load_full().category_code(layer, input)
    }

    /// Canonical alphabetic subcategory code for any accepted input form.
    pub fn resolve_subcategory_code(
        &self,
        layer: &str,
        category: &str,
        input: &str,
    ) -> TaxonomyResult<String> {
        self.current
            .load_full()
            .subcategory_code(layer, category, input)
    }

    /// Resolves free-form inputs to a full path against one generation.
    pub fn resolve_path(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
    ) -> TaxonomyResult<TaxonomyPath> {
        self.resolve_versioned_path(layer, category, subcategory)
            .map(|(path, _)| path)
    }

    /// Like `resolve_path`, also returning the version of the tree that
    /// produced the path.
    ///
    /// Both values come from the same generation, even if `invalidate` runs
    /// concurrently.
    pub fn resolve_versioned_path(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
    ) -> TaxonomyResult<(TaxonomyPath, TaxonomyVersion)> {
        let generation = self.current.load_full();
        let path = generation.path(layer, category, subcategory)?;
        Ok((path, generation.tree.version()))
    }

    pub fn to_mfa(&self, hfn: &str) -> TaxonomyResult<String> {
        let generation = self.current.load_full();
        AddressCodec::new(&generation.tree).to_mfa(hfn)
    }

    pub fn to_hfn(&self, mfa: &str) -> TaxonomyResult<String> {
        let generation = self.current.load_full();
        AddressCodec::new(&generation.tree).to_hfn(mfa)
    }

    /// Parses either address form.
    pub fn parse(&self, input: &str) -> TaxonomyResult<Address> {
        let generation = self.current.load_full();
        AddressCodec::new(&generation.tree).parse(input)
    }

    pub fn convert(&self, input: &str, target: AddressForm) -> TaxonomyResult<String> {
        let generation = self.current.load_full();
        AddressCodec::new(&generation.tree).convert(input, target)
    }

    /// Replaces the active tree and drops every memoized entry.
    ///
    /// Returns the version that was replaced.
    ///
    /// # Errors
    /// - `StaleVersion` when `tree` is not strictly newer than the active one.
    pub fn invalidate(&self, tree: TaxonomyTree) -> CacheResult<TaxonomyVersion> {
        let offered = tree.version();
        let next = Arc::new(CacheGeneration::new(Arc::new(tree)));
        loop {
            let current = self.current.load_full();
            let active = current.tree.version();
            if offered <= active {
                warn!(
                    "event=cache_invalidate module=cache status=error reason=stale_version active={} offered={}",
                    active, offered
                );
                return Err(CacheError::StaleVersion { active, offered });
            }

            let previous = self.current.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&previous, &current) {
                info!(
                    "event=cache_invalidate module=cache status=ok from={} to={} dropped_entries={}",
                    active,
                    offered,
                    current.entry_count()
                );
                return Ok(active);
            }
        }
    }

    /// Loads a tree from `source` and swaps it in.
    pub fn reload(&self, source: &dyn TaxonomySource) -> CacheResult<TaxonomyVersion> {
        let tree = source.load_tree()?;
        self.invalidate(tree)
    }

    pub fn stats(&self) -> CacheStats {
        let generation = self.current.load();
        CacheStats {
            version: generation.tree.version(),
            hits: generation.hits.load(Ordering::Relaxed),
            misses: generation.misses.load(Ordering::Relaxed),
            entries: generation.entry_count(),
        }
    }
}

impl std::fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCache")
            .field("stats", &self.stats())
            .finish()
    }
}
