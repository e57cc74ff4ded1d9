//! Taxonomy node model.
//!
//! # Responsibility
//! - Define the canonical Layer / Category / Subcategory records held by a
//!   loaded taxonomy tree.
//! - Carry both code forms (alphabetic and numeric) on every node.
//!
//! # Invariants
//! - Layer alpha codes are one uppercase ASCII letter, numeric codes `1..=10`.
//! - Category/subcategory alpha codes are three uppercase ASCII letters,
//!   numeric codes `1..=999`.
//! - Nodes are immutable once a tree is built; a new taxonomy version builds
//!   new nodes instead of mutating old ones.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lowest valid layer numeric code.
pub const LAYER_NUMERIC_MIN: u8 = 1;
/// Highest valid layer numeric code.
pub const LAYER_NUMERIC_MAX: u8 = 10;
/// Lowest valid category/subcategory numeric code.
pub const ENTRY_NUMERIC_MIN: u16 = 1;
/// Highest valid category/subcategory numeric code.
pub const ENTRY_NUMERIC_MAX: u16 = 999;
/// Length of category/subcategory alphabetic codes.
pub const ENTRY_ALPHA_LEN: usize = 3;

/// Monotonically increasing identifier of one loaded taxonomy snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaxonomyVersion(pub u64);

impl Display for TaxonomyVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Hierarchy level of one taxonomy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyLevel {
    Layer,
    Category,
    Subcategory,
}

impl TaxonomyLevel {
    /// Stable lowercase label used in errors and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
        }
    }
}

impl Display for TaxonomyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level taxonomy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// One uppercase ASCII letter, e.g. `S`.
    pub alpha_code: char,
    /// Unpadded numeric code in `1..=10`.
    pub numeric_code: u8,
    /// Display name, e.g. `Stars`.
    pub name: String,
}

/// Category or subcategory node.
///
/// Both levels share one shape; ownership (layer, or layer + category) is
/// implied by where the entry sits in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    /// Canonical three-letter code. Synthesized when the source had none.
    pub alpha_code: String,
    /// Numeric code in `1..=999`. Positional when the source had none.
    pub numeric_code: u16,
    /// Display name as declared by the snapshot.
    pub name: String,
    /// `false` means `alpha_code` was synthesized from `name`.
    pub source_has_explicit_code: bool,
    /// `false` means `numeric_code` was derived from `position`.
    pub source_has_explicit_numeric_code: bool,
    /// Zero-based declared position within the parent.
    pub position: usize,
}

/// Category owned by exactly one layer.
pub type Category = TaxonomyEntry;

/// Subcategory owned by exactly one `(layer, category)` pair.
pub type Subcategory = TaxonomyEntry;

/// One fully resolved taxonomy node triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyPath {
    pub layer: Layer,
    pub category: Category,
    pub subcategory: Subcategory,
}

impl TaxonomyPath {
    /// Alphabetic rendering without the sequential part, e.g. `S.POP.HPM`.
    pub fn alpha_prefix(&self) -> String {
        format!(
            "{}.{}.{}",
            self.layer.alpha_code, self.category.alpha_code, self.subcategory.alpha_code
        )
    }

    /// Numeric rendering without the sequential part, e.g. `2.001.007`.
    pub fn numeric_prefix(&self) -> String {
        format!(
            "{}.{:03}.{:03}",
            self.layer.numeric_code, self.category.numeric_code, self.subcategory.numeric_code
        )
    }
}
