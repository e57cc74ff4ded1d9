//! Versioned lookup cache over the active taxonomy tree.
//!
//! # Responsibility
//! - Memoize category/subcategory listings and canonical code resolution.
//! - Swap in a new taxonomy version atomically.
//!
//! # Invariants
//! - A reader works against exactly one generation for the whole call.
//! - Memo tables belong to a generation; replacing it drops them all.
//! - Versions only move forward.

use crate::model::taxonomy::TaxonomyVersion;
use crate::taxonomy::TaxonomyLoadError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod registry_cache;

pub use registry_cache::{CacheStats, RegistryCache};

/// Result type for cache replacement operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised while replacing the active generation.
#[derive(Debug)]
pub enum CacheError {
    /// Offered tree is not newer than the active one.
    StaleVersion {
        active: TaxonomyVersion,
        offered: TaxonomyVersion,
    },
    /// The source failed to produce a valid tree.
    Load(TaxonomyLoadError),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleVersion { active, offered } => write!(
                f,
                "taxonomy {offered} is not newer than active taxonomy {active}"
            ),
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StaleVersion { .. } => None,
            Self::Load(err) => Some(err),
        }
    }
}

impl From<TaxonomyLoadError> for CacheError {
    fn from(value: TaxonomyLoadError) -> Self {
        Self::Load(value)
    }
}
