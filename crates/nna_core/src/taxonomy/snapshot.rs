//! Serialized taxonomy snapshot schema.
//!
//! # Responsibility
//! - Define the JSON shape a taxonomy source delivers.
//! - Keep optional code fields optional so the resolver can fill them in.
//!
//! # Invariants
//! - Declared order of categories and subcategories is preserved; positional
//!   numeric codes depend on it.

use super::TaxonomyLoadResult;
use crate::model::taxonomy::TaxonomyVersion;
use serde::{Deserialize, Serialize};

/// One complete taxonomy state plus its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    /// Strictly increasing across snapshots from one source.
    pub version: TaxonomyVersion,
    pub layers: Vec<LayerRecord>,
}

impl TaxonomySnapshot {
    /// Parses a snapshot from its JSON text.
    ///
    /// Only schema-level checks happen here; code rules are enforced by
    /// `TaxonomyTree::from_snapshot`.
    pub fn from_json_str(text: &str) -> TaxonomyLoadResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes this snapshot as pretty JSON.
    pub fn to_json_string(&self) -> TaxonomyLoadResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Layer declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// One uppercase letter.
    pub code: String,
    pub numeric_code: u8,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
}

/// Category declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Three letters when present; synthesized from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Positional (1-based declared order) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_code: Option<u16>,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRecord>,
}

/// Subcategory declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_code: Option<u16>,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::TaxonomySnapshot;
    use crate::model::taxonomy::TaxonomyVersion;
    use crate::taxonomy::TaxonomyLoadError;

    #[test]
    fn parses_optional_codes() {
        let snapshot = TaxonomySnapshot::from_json_str(
            r#"{
                "version": 3,
                "layers": [{
                    "code": "W", "numeric_code": 5, "name": "Worlds",
                    "categories": [{
                        "name": "Beach",
                        "subcategories": [{ "code": "SUN", "name": "Sunset" }]
                    }]
                }]
            }"#,
        )
        .expect("snapshot should parse");

        assert_eq!(snapshot.version, TaxonomyVersion(3));
        let category = &snapshot.layers[0].categories[0];
        assert_eq!(category.code, None);
        assert_eq!(category.numeric_code, None);
        assert_eq!(category.subcategories[0].code.as_deref(), Some("SUN"));
    }

    #[test]
    fn rejects_payload_without_version() {
        let err = TaxonomySnapshot::from_json_str(r#"{ "layers": [] }"#)
            .expect_err("version is required");
        assert!(matches!(err, TaxonomyLoadError::Parse(_)));
    }
}
