//! Per-path sequential number allocation.
//!
//! # Responsibility
//! - Define the allocator contract (`peek_next`, `commit`) and counter keys.
//! - Provide the in-memory allocator; the durable one lives in `repo`.
//!
//! # Invariants
//! - An unseen path previews and commits `1`.
//! - `commit` returns each value exactly once per path, in increasing
//!   order, under any interleaving of concurrent callers.
//! - Counters are never deleted or rolled back.
//! - `u32::MAX` is the last value issued on a path; after it the counter
//!   stays at `EXHAUSTED_NEXT` and every `peek_next`/`commit` is `Exhausted`.

use crate::db::DbError;
use crate::model::taxonomy::TaxonomyPath;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;

pub use memory::InMemorySequenceAllocator;

/// First value issued on a path.
pub const FIRST_SEQUENTIAL: u32 = 1;

/// Stored `next` of a counter that has issued `u32::MAX`.
pub const EXHAUSTED_NEXT: u64 = u32::MAX as u64 + 1;

/// Result type for allocator operations.
pub type SequenceResult<T> = Result<T, SequenceError>;

/// Counter key: canonical alphabetic codes of one taxonomy path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequencePath {
    pub layer: String,
    pub category: String,
    pub subcategory: String,
}

impl SequencePath {
    /// Builds a key from raw codes, trimming and uppercasing each segment.
    pub fn new(
        layer: impl AsRef<str>,
        category: impl AsRef<str>,
        subcategory: impl AsRef<str>,
    ) -> Self {
        Self {
            layer: normalize_segment(layer.as_ref()),
            category: normalize_segment(category.as_ref()),
            subcategory: normalize_segment(subcategory.as_ref()),
        }
    }

    /// Builds a key from a resolved taxonomy path.
    pub fn from_taxonomy_path(path: &TaxonomyPath) -> Self {
        Self {
            layer: path.layer.alpha_code.to_string(),
            category: path.category.alpha_code.clone(),
            subcategory: path.subcategory.alpha_code.clone(),
        }
    }
}

impl Display for SequencePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.layer, self.category, self.subcategory)
    }
}

/// One active counter, for diagnostics listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCounter {
    pub path: SequencePath,
    /// Value the next `commit` will return, or `EXHAUSTED_NEXT`.
    pub next: u64,
}

/// Allocator failures. The in-memory allocator only ever raises `Exhausted`.
#[derive(Debug)]
pub enum SequenceError {
    /// The counter already issued `u32::MAX`.
    Exhausted(SequencePath),
    /// Durable storage failure.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted counter value is outside the valid range.
    InvalidData(String),
}

impl Display for SequenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted(path) => write!(f, "sequence exhausted for `{path}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "sequence store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid sequence data: {message}"),
        }
    }
}

impl Error for SequenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Exhausted(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SequenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SequenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Allocator contract shared by in-memory and durable implementations.
pub trait SequenceAllocator: Send + Sync {
    /// Returns the value the next `commit` would return, without mutating.
    ///
    /// Fails with `Exhausted` exactly when the next `commit` would.
    fn peek_next(&self, path: &SequencePath) -> SequenceResult<u32>;
    /// Atomically returns the current value and advances the counter.
    fn commit(&self, path: &SequencePath) -> SequenceResult<u32>;
    /// Lists active counters ordered by path.
    fn counters(&self) -> SequenceResult<Vec<SequenceCounter>>;
}

impl<A: SequenceAllocator + ?Sized> SequenceAllocator for std::sync::Arc<A> {
    fn peek_next(&self, path: &SequencePath) -> SequenceResult<u32> {
        (**self).peek_next(path)
    }

    fn commit(&self, path: &SequencePath) -> SequenceResult<u32> {
        (**self).commit(path)
    }

    fn counters(&self) -> SequenceResult<Vec<SequenceCounter>> {
        (**self).counters()
    }
}

/// Narrows a stored `next` to an issuable sequential.
pub(crate) fn issuable(path: &SequencePath, next: u64) -> SequenceResult<u32> {
    u32::try_from(next).map_err(|_| SequenceError::Exhausted(path.clone()))
}

fn normalize_segment(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::SequencePath;

    #[test]
    fn path_is_normalized_and_displayed_dotted() {
        let path = SequencePath::new(" g", "pop ", "Bas");
        assert_eq!(path.to_string(), "G.POP.BAS");
        assert_eq!(path, SequencePath::new("G", "POP", "BAS"));
    }
}
