//! Immutable, indexed taxonomy tree.
//!
//! # Responsibility
//! - Build the Layer → Category → Subcategory hierarchy from one snapshot,
//!   validating codes and resolving missing ones exactly once.
//! - Answer lookups with a fixed precedence instead of per-layer exceptions.
//!
//! # Invariants
//! - Listing order is declared order; layers are ordered by numeric code.
//! - Lookup precedence: alphabetic code, numeric code (all-digit input only),
//!   case-insensitive name, partial name. First stage with a hit wins.
//! - A stage with several hits is `AmbiguousName`; no hit anywhere is
//!   `NotFound`.

use super::resolver::{resolve_alphabetic_code, resolve_numeric_code, CodedEntry};
use super::{
    TaxonomyError, TaxonomyLoadError, TaxonomyLoadResult, TaxonomyResult, TaxonomySnapshot,
};
use crate::model::taxonomy::{
    Category, Layer, Subcategory, TaxonomyEntry, TaxonomyLevel, TaxonomyPath, TaxonomyVersion,
    ENTRY_ALPHA_LEN, ENTRY_NUMERIC_MAX, ENTRY_NUMERIC_MIN, LAYER_NUMERIC_MAX, LAYER_NUMERIC_MIN,
};
use std::collections::HashMap;

/// Strict code used by address conversion; never falls through to names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKey<'a> {
    Alpha(&'a str),
    Numeric(u16),
}

impl CodeKey<'_> {
    fn describe(&self) -> String {
        match self {
            Self::Alpha(code) => (*code).to_string(),
            Self::Numeric(value) => value.to_string(),
        }
    }
}

/// Loaded taxonomy for one version.
#[derive(Debug, Clone)]
pub struct TaxonomyTree {
    version: TaxonomyVersion,
    layers: Vec<LayerNode>,
    layer_by_alpha: HashMap<char, usize>,
    layer_by_numeric: HashMap<u8, usize>,
}

#[derive(Debug, Clone)]
struct LayerNode {
    layer: Layer,
    categories: ScopedEntries,
    /// `subcategories[i]` belongs to `categories.entries[i]`.
    subcategories: Vec<ScopedEntries>,
}

#[derive(Debug, Clone, Default)]
struct ScopedEntries {
    entries: Vec<TaxonomyEntry>,
    by_alpha: HashMap<String, usize>,
    by_numeric: HashMap<u16, usize>,
}

impl TaxonomyTree {
    /// Builds and validates a tree from one snapshot.
    ///
    /// # Errors
    /// - Any code, range, blank-name or uniqueness violation in the snapshot.
    pub fn from_snapshot(snapshot: &TaxonomySnapshot) -> TaxonomyLoadResult<Self> {
        if snapshot.layers.is_empty() {
            return Err(TaxonomyLoadError::NoLayers);
        }

        let mut layers = Vec::with_capacity(snapshot.layers.len());
        for record in &snapshot.layers {
            let layer = build_layer(&record.code, record.numeric_code, &record.name)?;
            let scope = layer.alpha_code.to_string();
            let categories =
                ScopedEntries::build(TaxonomyLevel::Category, &scope, &record.categories)?;

            let mut subcategories = Vec::with_capacity(record.categories.len());
            for (category_record, category) in record.categories.iter().zip(&categories.entries) {
                let sub_scope = format!("{scope}.{}", category.alpha_code);
                subcategories.push(ScopedEntries::build(
                    TaxonomyLevel::Subcategory,
                    &sub_scope,
                    &category_record.subcategories,
                )?);
            }

            layers.push(LayerNode {
                layer,
                categories,
                subcategories,
            });
        }
        layers.sort_by_key(|node| node.layer.numeric_code);

        let mut layer_by_alpha = HashMap::new();
        let mut layer_by_numeric = HashMap::new();
        for (index, node) in layers.iter().enumerate() {
            if layer_by_alpha.insert(node.layer.alpha_code, index).is_some() {
                return Err(TaxonomyLoadError::DuplicateAlphaCode {
                    level: TaxonomyLevel::Layer,
                    scope: String::new(),
                    code: node.layer.alpha_code.to_string(),
                });
            }
            if layer_by_numeric
                .insert(node.layer.numeric_code, index)
                .is_some()
            {
                return Err(TaxonomyLoadError::DuplicateNumericCode {
                    level: TaxonomyLevel::Layer,
                    scope: String::new(),
                    numeric_code: u16::from(node.layer.numeric_code),
                });
            }
        }

        Ok(Self {
            version: snapshot.version,
            layers,
            layer_by_alpha,
            layer_by_numeric,
        })
    }

    pub fn version(&self) -> TaxonomyVersion {
        self.version
    }

    /// Layers ordered by numeric code.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().map(|node| &node.layer)
    }

    /// Total number of categories and subcategories, for diagnostics.
    pub fn entry_count(&self) -> usize {
        self.layers
            .iter()
            .map(|node| {
                node.categories.entries.len()
                    + node
                        .subcategories
                        .iter()
                        .map(|subs| subs.entries.len())
                        .sum::<usize>()
            })
            .sum()
    }

    /// Looks up a layer by letter, numeric code or name.
    pub fn lookup_layer(&self, input: &str) -> TaxonomyResult<&Layer> {
        let index = self.layer_index(input)?;
        Ok(&self.layers[index].layer)
    }

    /// Looks up a category within a layer by code, numeric code or name.
    pub fn lookup_category(&self, layer: &str, input: &str) -> TaxonomyResult<&Category> {
        let layer_index = self.layer_index(layer)?;
        let node = &self.layers[layer_index];
        let index = node.categories.find(
            TaxonomyLevel::Category,
            &node.layer.alpha_code.to_string(),
            input,
        )?;
        Ok(&node.categories.entries[index])
    }

    /// Looks up a subcategory within a `(layer, category)` pair.
    pub fn lookup_subcategory(
        &self,
        layer: &str,
        category: &str,
        input: &str,
    ) -> TaxonomyResult<&Subcategory> {
        let (layer_index, category_index) = self.category_position(layer, category)?;
        let node = &self.layers[layer_index];
        let scope = format!(
            "{}.{}",
            node.layer.alpha_code, node.categories.entries[category_index].alpha_code
        );
        let subs = &node.subcategories[category_index];
        let index = subs.find(TaxonomyLevel::Subcategory, &scope, input)?;
        Ok(&subs.entries[index])
    }

    /// Categories of one layer in declared order.
    pub fn list_categories(&self, layer: &str) -> TaxonomyResult<&[Category]> {
        let index = self.layer_index(layer)?;
        Ok(&self.layers[index].categories.entries)
    }

    /// Subcategories of one category in declared order.
    pub fn list_subcategories(&self, layer: &str, category: &str) -> TaxonomyResult<&[Subcategory]> {
        let (layer_index, category_index) = self.category_position(layer, category)?;
        Ok(&self.layers[layer_index].subcategories[category_index].entries)
    }

    /// Resolves a full path from free-form inputs using lookup precedence.
    pub fn resolve_path(
        &self,
        layer: &str,
        category: &str,
        subcategory: &str,
    ) -> TaxonomyResult<TaxonomyPath> {
        let layer_node = self.lookup_layer(layer)?;
        let layer_code = layer_node.alpha_code.to_string();
        let category_node = self.lookup_category(&layer_code, category)?;
        let subcategory_node =
            self.lookup_subcategory(&layer_code, &category_node.alpha_code, subcategory)?;
        Ok(TaxonomyPath {
            layer: layer_node.clone(),
            category: category_node.clone(),
            subcategory: subcategory_node.clone(),
        })
    }

    /// Resolves a full path from strict codes only.
    ///
    /// Alphabetic keys must match exactly; no name matching is attempted.
    pub fn resolve_codes(
        &self,
        layer: CodeKey<'_>,
        category: CodeKey<'_>,
        subcategory: CodeKey<'_>,
    ) -> TaxonomyResult<TaxonomyPath> {
        let layer_index = match layer {
            CodeKey::Alpha(code) => {
                let mut chars = code.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) => self.layer_by_alpha.get(&letter).copied(),
                    _ => None,
                }
            }
            CodeKey::Numeric(value) => u8::try_from(value)
                .ok()
                .and_then(|numeric| self.layer_by_numeric.get(&numeric).copied()),
        }
        .ok_or_else(|| TaxonomyError::not_found(TaxonomyLevel::Layer, "", layer.describe()))?;

        let node = &self.layers[layer_index];
        let layer_scope = node.layer.alpha_code.to_string();
        let category_index = node
            .categories
            .find_code(category)
            .ok_or_else(|| {
                TaxonomyError::not_found(
                    TaxonomyLevel::Category,
                    layer_scope.as_str(),
                    category.describe(),
                )
            })?;
        let category_node = &node.categories.entries[category_index];

        let subs = &node.subcategories[category_index];
        let subcategory_index = subs.find_code(subcategory).ok_or_else(|| {
            TaxonomyError::not_found(
                TaxonomyLevel::Subcategory,
                format!("{layer_scope}.{}", category_node.alpha_code),
                subcategory.describe(),
            )
        })?;

        Ok(TaxonomyPath {
            layer: node.layer.clone(),
            category: category_node.clone(),
            subcategory: subs.entries[subcategory_index].clone(),
        })
    }

    fn layer_index(&self, input: &str) -> TaxonomyResult<usize> {
        let trimmed = input.trim();
        let not_found = || TaxonomyError::not_found(TaxonomyLevel::Layer, "", trimmed);
        if trimmed.is_empty() {
            return Err(not_found());
        }

        let mut chars = trimmed.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            if let Some(index) = self.layer_by_alpha.get(&letter.to_ascii_uppercase()) {
                return Ok(*index);
            }
        }

        if is_all_digits(trimmed) {
            if let Some(index) = trimmed
                .parse::<u8>()
                .ok()
                .and_then(|numeric| self.layer_by_numeric.get(&numeric))
            {
                return Ok(*index);
            }
        }

        let candidates = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, node)| (index, node.layer.alpha_code.to_string(), &node.layer.name))
            .collect::<Vec<_>>();
        match_name(&candidates, trimmed)
            .into_result(TaxonomyLevel::Layer, "", trimmed)
    }

    fn category_position(&self, layer: &str, category: &str) -> TaxonomyResult<(usize, usize)> {
        let layer_index = self.layer_index(layer)?;
        let node = &self.layers[layer_index];
        let category_index = node.categories.find(
            TaxonomyLevel::Category,
            &node.layer.alpha_code.to_string(),
            category,
        )?;
        Ok((layer_index, category_index))
    }
}

impl ScopedEntries {
    fn build<R: CodedEntry>(
        level: TaxonomyLevel,
        scope: &str,
        records: &[R],
    ) -> TaxonomyLoadResult<Self> {
        let mut scoped = Self::default();
        for (position, record) in records.iter().enumerate() {
            let name = record.name().trim();
            if name.is_empty() {
                return Err(TaxonomyLoadError::BlankName {
                    level,
                    scope: scope.to_string(),
                });
            }

            if let Some(code) = record.explicit_alpha_code() {
                let code = code.trim();
                if code.len() != ENTRY_ALPHA_LEN || !code.chars().all(|c| c.is_ascii_alphabetic())
                {
                    return Err(TaxonomyLoadError::InvalidAlphaCode {
                        level,
                        scope: scope.to_string(),
                        code: code.to_string(),
                    });
                }
            }
            let alpha_code = resolve_alphabetic_code(record);

            let numeric = resolve_numeric_code(record, position);
            let numeric_code = u16::try_from(numeric)
                .ok()
                .filter(|value| (ENTRY_NUMERIC_MIN..=ENTRY_NUMERIC_MAX).contains(value))
                .ok_or_else(|| TaxonomyLoadError::NumericOutOfRange {
                    level,
                    scope: scope.to_string(),
                    numeric_code: numeric,
                })?;

            if scoped.by_alpha.contains_key(&alpha_code) {
                return Err(TaxonomyLoadError::DuplicateAlphaCode {
                    level,
                    scope: scope.to_string(),
                    code: alpha_code,
                });
            }
            if scoped.by_numeric.contains_key(&numeric_code) {
                return Err(TaxonomyLoadError::DuplicateNumericCode {
                    level,
                    scope: scope.to_string(),
                    numeric_code,
                });
            }

            scoped.by_alpha.insert(alpha_code.clone(), position);
            scoped.by_numeric.insert(numeric_code, position);
            scoped.entries.push(TaxonomyEntry {
                alpha_code,
                numeric_code,
                name: name.to_string(),
                source_has_explicit_code: record.explicit_alpha_code().is_some(),
                source_has_explicit_numeric_code: record.explicit_numeric_code().is_some(),
                position,
            });
        }
        Ok(scoped)
    }

    fn find_code(&self, key: CodeKey<'_>) -> Option<usize> {
        match key {
            CodeKey::Alpha(code) => self.by_alpha.get(code).copied(),
            CodeKey::Numeric(value) => self.by_numeric.get(&value).copied(),
        }
    }

    fn find(&self, level: TaxonomyLevel, scope: &str, input: &str) -> TaxonomyResult<usize> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TaxonomyError::not_found(level, scope, trimmed));
        }

        if let Some(index) = self.by_alpha.get(&trimmed.to_ascii_uppercase()) {
            return Ok(*index);
        }

        if is_all_digits(trimmed) {
            if let Some(index) = trimmed
                .parse::<u16>()
                .ok()
                .and_then(|numeric| self.by_numeric.get(&numeric))
            {
                return Ok(*index);
            }
        }

        let candidates = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, entry.alpha_code.clone(), &entry.name))
            .collect::<Vec<_>>();
        match_name(&candidates, trimmed).into_result(level, scope, trimmed)
    }
}

enum NameMatch {
    Unique(usize),
    Ambiguous(Vec<String>),
    Missing,
}

impl NameMatch {
    fn into_result(self, level: TaxonomyLevel, scope: &str, input: &str) -> TaxonomyResult<usize> {
        match self {
            Self::Unique(index) => Ok(index),
            Self::Ambiguous(candidates) => Err(TaxonomyError::AmbiguousName {
                level,
                scope: scope.to_string(),
                input: input.to_string(),
                candidates,
            }),
            Self::Missing => Err(TaxonomyError::not_found(level, scope, input)),
        }
    }
}

/// Name stages of the lookup precedence: exact (case-insensitive), then
/// partial. Candidates are `(index, code, name)` in declared order.
fn match_name(candidates: &[(usize, String, &String)], input: &str) -> NameMatch {
    let needle = normalize_name(input);
    if needle.is_empty() {
        return NameMatch::Missing;
    }

    let exact = candidates
        .iter()
        .filter(|(_, _, name)| normalize_name(name) == needle)
        .collect::<Vec<_>>();
    if !exact.is_empty() {
        return pick(&exact);
    }

    let partial = candidates
        .iter()
        .filter(|(_, _, name)| normalize_name(name).contains(&needle))
        .collect::<Vec<_>>();
    if partial.is_empty() {
        return NameMatch::Missing;
    }
    pick(&partial)
}

fn pick(hits: &[&(usize, String, &String)]) -> NameMatch {
    match hits {
        [(index, _, _)] => NameMatch::Unique(*index),
        many => NameMatch::Ambiguous(many.iter().map(|(_, code, _)| code.clone()).collect()),
    }
}

/// Lowercases and collapses `_`, `-` and whitespace runs into one space.
fn normalize_name(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Folds free-form lookup input to a key that decides the lookup outcome.
///
/// Two inputs with the same key resolve to the same entry in any tree:
/// code and digit inputs keep their letters (uppercased) or digits, every
/// other input is reduced to its normalized name.
pub(crate) fn lookup_key(value: &str) -> String {
    let trimmed = value.trim();
    if is_all_digits(trimmed) || trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        trimmed.to_ascii_uppercase()
    } else {
        normalize_name(trimmed)
    }
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn build_layer(code: &str, numeric_code: u8, name: &str) -> TaxonomyLoadResult<Layer> {
    let trimmed = code.trim();
    let mut chars = trimmed.chars();
    let alpha_code = match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_uppercase() => letter,
        _ => return Err(TaxonomyLoadError::InvalidLayerCode(trimmed.to_string())),
    };
    if !(LAYER_NUMERIC_MIN..=LAYER_NUMERIC_MAX).contains(&numeric_code) {
        return Err(TaxonomyLoadError::LayerNumericOutOfRange {
            code: trimmed.to_string(),
            numeric_code,
        });
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(TaxonomyLoadError::BlankName {
            level: TaxonomyLevel::Layer,
            scope: trimmed.to_string(),
        });
    }
    Ok(Layer {
        alpha_code,
        numeric_code,
        name: name.to_string(),
    })
}
