//! Durable persistence implementations.
//!
//! # Responsibility
//! - Keep SQLite query details behind the allocator contract.
//!
//! # Invariants
//! - Repositories only accept connections at the latest migrated version.

pub mod sequence_repo;
