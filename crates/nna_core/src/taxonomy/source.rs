//! Taxonomy snapshot sources.
//!
//! # Responsibility
//! - Define the seam through which a snapshot (and its version) enters core.
//! - Provide the bundled built-in snapshot and a JSON file source.
//!
//! # Invariants
//! - Sources only deliver data; validation happens in tree construction.
//! - Remote sources live outside core and implement the same trait.

use super::{TaxonomyLoadError, TaxonomyLoadResult, TaxonomySnapshot, TaxonomyTree};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

const BUILTIN_SNAPSHOT_JSON: &str = include_str!("../../data/taxonomy.json");

/// Provider of taxonomy snapshots.
pub trait TaxonomySource: Send + Sync {
    /// Short identifier used in log events, e.g. `builtin` or `file`.
    fn source_id(&self) -> &str;
    /// Fetches the current snapshot.
    fn load_snapshot(&self) -> TaxonomyLoadResult<TaxonomySnapshot>;

    /// Fetches the current snapshot and builds a validated tree from it.
    ///
    /// # Side effects
    /// - Emits `taxonomy_load` logging events with duration and status.
    fn load_tree(&self) -> TaxonomyLoadResult<TaxonomyTree> {
        let started_at = Instant::now();
        let result = self
            .load_snapshot()
            .and_then(|snapshot| TaxonomyTree::from_snapshot(&snapshot));
        match &result {
            Ok(tree) => info!(
                "event=taxonomy_load module=taxonomy status=ok source={} version={} layers={} entries={} duration_ms={}",
                self.source_id(),
                tree.version(),
                tree.layers().count(),
                tree.entry_count(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=taxonomy_load module=taxonomy status=error source={} duration_ms={} error={}",
                self.source_id(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

/// Snapshot compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSnapshotSource;

impl TaxonomySource for BuiltinSnapshotSource {
    fn source_id(&self) -> &str {
        "builtin"
    }

    fn load_snapshot(&self) -> TaxonomyLoadResult<TaxonomySnapshot> {
        TaxonomySnapshot::from_json_str(BUILTIN_SNAPSHOT_JSON)
    }
}

/// Snapshot read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaxonomySource for FileSnapshotSource {
    fn source_id(&self) -> &str {
        "file"
    }

    fn load_snapshot(&self) -> TaxonomyLoadResult<TaxonomySnapshot> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| TaxonomyLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        TaxonomySnapshot::from_json_str(&text)
    }
}
