//! Core domain logic for the NNA asset registry.
//! This crate owns the taxonomy, address and sequence invariants.

pub mod cache;
pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sequence;
pub mod service;
pub mod taxonomy;

pub use cache::{CacheError, CacheResult, CacheStats, RegistryCache};
pub use codec::AddressCodec;
pub use config::{ConfigError, RegistryConfig};
pub use db::{DbError, DbResult, DbTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::address::{Address, AddressForm};
pub use model::taxonomy::{
    Category, Layer, Subcategory, TaxonomyEntry, TaxonomyLevel, TaxonomyPath, TaxonomyVersion,
};
pub use repo::sequence_repo::SqliteSequenceAllocator;
pub use sequence::{
    InMemorySequenceAllocator, SequenceAllocator, SequenceCounter, SequenceError, SequencePath,
    SequenceResult, EXHAUSTED_NEXT, FIRST_SEQUENTIAL,
};
pub use service::naming_service::{
    AssetNamingService, NamingServiceError, NamingServiceResult, RegisteredAsset,
};
pub use taxonomy::{
    BuiltinSnapshotSource, FileSnapshotSource, TaxonomyError, TaxonomyLoadError, TaxonomyResult,
    TaxonomySnapshot, TaxonomySource, TaxonomyTree,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
