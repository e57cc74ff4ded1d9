//! Asset naming use-case service.
//!
//! # Responsibility
//! - Resolve caller input to a taxonomy path through the registry cache.
//! - Preview and issue addresses backed by the sequence allocator.
//! - Reload the taxonomy from a snapshot source.
//!
//! # Invariants
//! - A path must resolve before the allocator is consulted.
//! - An issued address and its `taxonomy_version` come from one taxonomy
//!   generation.
//! - Input that would make an invalid address is rejected before `commit`,
//!   so no number is burned on it.
//! - A committed number is never handed out again, even if the caller later
//!   abandons the registration.

use crate::cache::{CacheError, RegistryCache};
use crate::model::address::{validate_suffix, Address};
use crate::model::taxonomy::{TaxonomyPath, TaxonomyVersion};
use crate::sequence::{SequenceAllocator, SequenceError, SequencePath};
use crate::taxonomy::{TaxonomyError, TaxonomySource};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from naming service operations.
#[derive(Debug)]
pub enum NamingServiceError {
    /// Lookup or address validation failure.
    Taxonomy(TaxonomyError),
    /// Sequence issuance failure.
    Sequence(SequenceError),
    /// Taxonomy reload failure.
    Cache(CacheError),
}

impl Display for NamingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Taxonomy(err) => write!(f, "{err}"),
            Self::Sequence(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NamingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Taxonomy(err) => Some(err),
            Self::Sequence(err) => Some(err),
            Self::Cache(err) => Some(err),
        }
    }
}

impl From<TaxonomyError> for NamingServiceError {
    fn from(value: TaxonomyError) -> Self {
        Self::Taxonomy(value)
    }
}

impl From<SequenceError> for NamingServiceError {
    fn from(value: SequenceError) -> Self {
        Self::Sequence(value)
    }
}

impl From<CacheError> for NamingServiceError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Result type for naming service operations.
pub type NamingServiceResult<T> = Result<T, NamingServiceError>;

/// One issued address with both renderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAsset {
    pub address: Address,
    pub hfn: String,
    pub mfa: String,
    /// Taxonomy version the address was resolved against.
    pub taxonomy_version: TaxonomyVersion,
}

/// Naming service facade.
pub struct AssetNamingService<A: SequenceAllocator> {
    cache: Arc<RegistryCache>,
    allocator: A,
}

impl<A: SequenceAllocator> AssetNamingService<A> {
    /// Creates service from a shared cache and an allocator implementation.
    pub fn new(cache: Arc<RegistryCache>, allocator: A) -> Self {
        Self { cache, allocator }
    }

    pub fn cache(&self) -> &Arc<RegistryCache> {
        &self.cache
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Resolves code, numeric or name input for each level.
    pub fn resolve_path(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
    ) -> NamingServiceResult<TaxonomyPath> {
        Ok(self.cache.resolve_path(layer, category, subcategory)?)
    }

    /// Builds the address the next `register` for this path would return.
    ///
    /// Read-only: the counter is not advanced.
    pub fn preview(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
        suffix: Option<&str>,
    ) -> NamingServiceResult<Address> {
        let (path, _) = self
            .cache
            .resolve_versioned_path(layer, category, subcategory)?;
        let next = self
            .allocator
            .peek_next(&SequencePath::from_taxonomy_path(&path))?;
        Ok(Address::new(path, next, suffix.map(str::to_string))?)
    }

    /// Issues the next address for the resolved path.
    ///
    /// # Side effects
    /// - Advances the path counter by one.
    /// - Emits `asset_register` logging events.
    pub fn register(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
        suffix: Option<&str>,
    ) -> NamingServiceResult<RegisteredAsset> {
        let (path, taxonomy_version) = self
            .cache
            .resolve_versioned_path(layer, category, subcategory)?;
        if let Some(value) = suffix {
            validate_suffix(value)?;
        }

        let sequence_path = SequencePath::from_taxonomy_path(&path);
        let sequential = match self.allocator.commit(&sequence_path) {
            Ok(value) => value,
            Err(err) => {
                error!(
                    "event=asset_register module=service status=error path={} error={}",
                    sequence_path, err
                );
                return Err(err.into());
            }
        };

        let address = Address::new(path, sequential, suffix.map(str::to_string))?;
        let asset = RegisteredAsset {
            hfn: address.to_hfn(),
            mfa: address.to_mfa(),
            address,
            taxonomy_version,
        };
        info!(
            "event=asset_register module=service status=ok hfn={} mfa={} taxonomy_version={}",
            asset.hfn, asset.mfa, asset.taxonomy_version
        );
        Ok(asset)
    }

    /// Swaps in the taxonomy currently offered by `source`.
    ///
    /// Returns the version that was replaced. Counters are untouched.
    pub fn reload(&self, source: &dyn TaxonomySource) -> NamingServiceResult<TaxonomyVersion> {
        Ok(self.cache.reload(source)?)
    }

    pub fn to_mfa(&self, hfn: &str) -> NamingServiceResult<String> {
        Ok(self.cache.to_mfa(hfn)?)
    }

    pub fn to_hfn(&self, mfa: &str) -> NamingServiceResult<String> {
        Ok(self.cache.to_hfn(mfa)?)
    }
}
