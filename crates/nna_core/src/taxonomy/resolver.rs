//! Canonical code resolution.
//!
//! # Responsibility
//! - Return the canonical three-letter code of a category/subcategory,
//!   synthesizing one from the display name when the source has none.
//! - Return the numeric code, falling back to declared position.
//! - Normalize free-form caller input to canonical codes through the tree.
//!
//! # Invariants
//! - Synthesis is a pure function of the name: same name, same code.
//! - Output codes are exactly three uppercase ASCII letters.

use super::tree::TaxonomyTree;
use super::{CategoryRecord, SubcategoryRecord, TaxonomyResult};
use crate::model::taxonomy::{TaxonomyEntry, ENTRY_ALPHA_LEN};

const PAD_LETTER: char = 'X';

/// Read access to the code-bearing fields of a category or subcategory,
/// whether still a snapshot record or already a tree node.
pub trait CodedEntry {
    fn name(&self) -> &str;
    /// `None` when the source carries no explicit alphabetic code.
    fn explicit_alpha_code(&self) -> Option<&str>;
    /// `None` when the source carries no explicit numeric code.
    fn explicit_numeric_code(&self) -> Option<u16>;
}

impl CodedEntry for CategoryRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn explicit_alpha_code(&self) -> Option<&str> {
        non_blank(self.code.as_deref())
    }

    fn explicit_numeric_code(&self) -> Option<u16> {
        self.numeric_code
    }
}

impl CodedEntry for SubcategoryRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn explicit_alpha_code(&self) -> Option<&str> {
        non_blank(self.code.as_deref())
    }

    fn explicit_numeric_code(&self) -> Option<u16> {
        self.numeric_code
    }
}

impl CodedEntry for TaxonomyEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn explicit_alpha_code(&self) -> Option<&str> {
        self.source_has_explicit_code
            .then_some(self.alpha_code.as_str())
    }

    fn explicit_numeric_code(&self) -> Option<u16> {
        self.source_has_explicit_numeric_code
            .then_some(self.numeric_code)
    }
}

/// Returns the canonical alphabetic code for one entry.
///
/// Explicit codes are trimmed and uppercased; otherwise the code is
/// synthesized from the entry name.
pub fn resolve_alphabetic_code(entry: &impl CodedEntry) -> String {
    match entry.explicit_alpha_code() {
        Some(code) => code.trim().to_ascii_uppercase(),
        None => synthesize_alphabetic_code(entry.name()),
    }
}

/// Returns the numeric code for one entry.
///
/// Falls back to the 1-based declared `position` when the source has no
/// explicit value. The result is unbounded here; range checks belong to tree
/// construction.
pub fn resolve_numeric_code(entry: &impl CodedEntry, position: usize) -> usize {
    match entry.explicit_numeric_code() {
        Some(value) => usize::from(value),
        None => position + 1,
    }
}

/// Synthesizes a three-letter code from a display name.
///
/// Words are split on `_`, `-` and whitespace; only ASCII letters count.
/// - three or more words: first letter of each of the first three words;
/// - two words: first two letters of the first word plus the first letter
///   of the second;
/// - one word: its first three letters.
///
/// Short results are right-padded with `X`.
pub fn synthesize_alphabetic_code(name: &str) -> String {
    let words = name
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphabetic)
                .collect::<Vec<_>>()
        })
        .filter(|letters| !letters.is_empty())
        .collect::<Vec<_>>();

    let mut letters = match words.as_slice() {
        [] => Vec::new(),
        [only] => only.iter().take(ENTRY_ALPHA_LEN).copied().collect(),
        [first, second] => first
            .iter()
            .take(2)
            .chain(second.iter().take(1))
            .copied()
            .collect(),
        [first, second, third, ..] => vec![first[0], second[0], third[0]],
    };
    letters.resize(ENTRY_ALPHA_LEN, PAD_LETTER);

    letters
        .into_iter()
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Normalizes any accepted category input (code, numeric id or name) to its
/// canonical alphabetic code.
pub fn canonical_category_code(
    tree: &TaxonomyTree,
    layer: &str,
    input: &str,
) -> TaxonomyResult<String> {
    Ok(tree.lookup_category(layer, input)?.alpha_code.clone())
}

/// Normalizes any accepted subcategory input to its canonical alphabetic code.
pub fn canonical_subcategory_code(
    tree: &TaxonomyTree,
    layer: &str,
    category: &str,
    input: &str,
) -> TaxonomyResult<String> {
    Ok(tree
        .lookup_subcategory(layer, category, input)?
        .alpha_code
        .clone())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|code| !code.trim().is_empty())
}
