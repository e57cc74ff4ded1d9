//! Taxonomy registry: snapshot loading, tree lookups and code resolution.
//!
//! # Responsibility
//! - Turn a taxonomy snapshot into an immutable, indexed `TaxonomyTree`.
//! - Resolve caller input (code, numeric id or name) to canonical nodes.
//! - Synthesize alphabetic codes deterministically for entries without one.
//!
//! # Invariants
//! - Lookups never fall back to a guessed default; a miss is `NotFound`.
//! - Name lookups that match several entries surface `AmbiguousName`.
//! - Code collisions are rejected at load time, never patched per lookup.

use crate::model::taxonomy::TaxonomyLevel;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod resolver;
pub mod snapshot;
pub mod source;
pub mod tree;

pub use resolver::{
    canonical_category_code, canonical_subcategory_code, resolve_alphabetic_code,
    resolve_numeric_code, synthesize_alphabetic_code, CodedEntry,
};
pub use snapshot::{CategoryRecord, LayerRecord, SubcategoryRecord, TaxonomySnapshot};
pub use source::{BuiltinSnapshotSource, FileSnapshotSource, TaxonomySource};
pub use tree::{CodeKey, TaxonomyTree};

/// Result type for lookups and conversions.
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;

/// Result type for snapshot loading and tree construction.
pub type TaxonomyLoadResult<T> = Result<T, TaxonomyLoadError>;

/// Caller-recoverable lookup and conversion errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    /// No node matched the input under any lookup stage.
    NotFound {
        level: TaxonomyLevel,
        /// Parent path the lookup ran in (`""` for layers, `S` or `S.POP`).
        scope: String,
        input: String,
    },
    /// Input does not match the HFN/MFA grammar or violates address invariants.
    MalformedAddress { input: String, reason: &'static str },
    /// A name lookup matched more than one entry at the same precedence stage.
    AmbiguousName {
        level: TaxonomyLevel,
        scope: String,
        input: String,
        /// Alphabetic codes of every matching entry, in declared order.
        candidates: Vec<String>,
    },
}

impl TaxonomyError {
    pub(crate) fn not_found(
        level: TaxonomyLevel,
        scope: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            level,
            scope: scope.into(),
            input: input.into(),
        }
    }

    pub(crate) fn malformed(input: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedAddress {
            input: input.into(),
            reason,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::MalformedAddress { .. } => "malformed_address",
            Self::AmbiguousName { .. } => "ambiguous_name",
        }
    }
}

impl Display for TaxonomyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                level,
                scope,
                input,
            } => {
                if scope.is_empty() {
                    write!(f, "{level} not found: `{input}`")
                } else {
                    write!(f, "{level} not found in `{scope}`: `{input}`")
                }
            }
            Self::MalformedAddress { input, reason } => {
                write!(f, "malformed address `{input}`: {reason}")
            }
            Self::AmbiguousName {
                level,
                scope,
                input,
                candidates,
            } => write!(
                f,
                "ambiguous {level} name `{input}` in `{scope}`; candidates: {}",
                candidates.join(", ")
            ),
        }
    }
}

impl Error for TaxonomyError {}

/// Errors raised while reading a snapshot or building a tree from it.
#[derive(Debug)]
pub enum TaxonomyLoadError {
    /// Snapshot file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Snapshot payload is not valid JSON for the snapshot schema.
    Parse(serde_json::Error),
    /// Snapshot declares no layers.
    NoLayers,
    /// Layer code is not a single uppercase ASCII letter.
    InvalidLayerCode(String),
    /// Layer numeric code is outside `1..=10`.
    LayerNumericOutOfRange { code: String, numeric_code: u8 },
    /// Display name is blank after trim.
    BlankName { level: TaxonomyLevel, scope: String },
    /// Explicit category/subcategory code is not three ASCII letters.
    InvalidAlphaCode {
        level: TaxonomyLevel,
        scope: String,
        code: String,
    },
    /// Explicit or positional numeric code is outside `1..=999`.
    NumericOutOfRange {
        level: TaxonomyLevel,
        scope: String,
        numeric_code: usize,
    },
    /// Two nodes in one scope resolve to the same alphabetic code.
    DuplicateAlphaCode {
        level: TaxonomyLevel,
        scope: String,
        code: String,
    },
    /// Two nodes in one scope resolve to the same numeric code.
    DuplicateNumericCode {
        level: TaxonomyLevel,
        scope: String,
        numeric_code: u16,
    },
}

impl Display for TaxonomyLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(
                f,
                "failed to read taxonomy snapshot `{}`: {source}",
                path.display()
            ),
            Self::Parse(err) => write!(f, "invalid taxonomy snapshot: {err}"),
            Self::NoLayers => write!(f, "taxonomy snapshot declares no layers"),
            Self::InvalidLayerCode(code) => write!(
                f,
                "layer code must be one uppercase letter, got `{code}`"
            ),
            Self::LayerNumericOutOfRange { code, numeric_code } => write!(
                f,
                "layer `{code}` numeric code {numeric_code} is outside 1..=10"
            ),
            Self::BlankName { level, scope } => {
                write!(f, "{level} in `{scope}` has a blank name")
            }
            Self::InvalidAlphaCode { level, scope, code } => write!(
                f,
                "{level} code in `{scope}` must be three letters, got `{code}`"
            ),
            Self::NumericOutOfRange {
                level,
                scope,
                numeric_code,
            } => write!(
                f,
                "{level} numeric code {numeric_code} in `{scope}` is outside 1..=999"
            ),
            Self::DuplicateAlphaCode { level, scope, code } => write!(
                f,
                "duplicate {level} code `{code}` in `{scope}`"
            ),
            Self::DuplicateNumericCode {
                level,
                scope,
                numeric_code,
            } => write!(
                f,
                "duplicate {level} numeric code {numeric_code:03} in `{scope}`"
            ),
        }
    }
}

impl Error for TaxonomyLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TaxonomyLoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
