//! Domain model for taxonomy nodes and asset addresses.
//!
//! # Responsibility
//! - Define canonical data structures shared by tree, codec and allocator.
//! - Keep address rendering next to the data it renders.
//!
//! # Invariants
//! - Every taxonomy node carries both an alphabetic and a numeric code.
//! - An `Address` always denotes one resolved taxonomy path.

pub mod address;
pub mod taxonomy;
