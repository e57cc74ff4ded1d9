//! Resolved asset address model.
//!
//! # Responsibility
//! - Hold one validated address: taxonomy path, sequential and suffix.
//! - Render the two equivalent string forms (HFN and MFA).
//!
//! # Invariants
//! - `sequential >= 1`.
//! - `suffix`, when present, is non-empty ASCII alphanumeric.
//! - Rendering is canonical: sequential is padded to at least 3 digits,
//!   category/subcategory numeric codes to exactly 3.

use crate::model::taxonomy::TaxonomyPath;
use crate::sequence::SequencePath;
use crate::taxonomy::{TaxonomyError, TaxonomyResult};
use std::fmt::{Display, Formatter};

/// The two dotted address renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressForm {
    /// Human-Friendly Name, e.g. `S.POP.HPM.001`.
    Hfn,
    /// Machine-Friendly Address, e.g. `2.001.007.001`.
    Mfa,
}

impl AddressForm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hfn => "hfn",
            Self::Mfa => "mfa",
        }
    }
}

impl Display for AddressForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated address of one asset instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Resolved layer / category / subcategory nodes.
    pub path: TaxonomyPath,
    /// Per-path instance number, starting at 1.
    pub sequential: u32,
    /// Optional trailing file-type segment, carried verbatim.
    pub suffix: Option<String>,
}

impl Address {
    /// Builds an address after checking sequential and suffix invariants.
    ///
    /// # Errors
    /// - `MalformedAddress` when `sequential == 0` or the suffix is empty or
    ///   contains non-alphanumeric characters.
    pub fn new(
        path: TaxonomyPath,
        sequential: u32,
        suffix: Option<String>,
    ) -> TaxonomyResult<Self> {
        if sequential == 0 {
            return Err(TaxonomyError::malformed(
                format!("{}.000", path.alpha_prefix()),
                "sequential must be at least 1",
            ));
        }
        if let Some(value) = suffix.as_deref() {
            validate_suffix(value)?;
        }
        Ok(Self {
            path,
            sequential,
            suffix,
        })
    }

    /// Renders `L.CCC.SSS.NNN[.suffix]`.
    pub fn to_hfn(&self) -> String {
        self.render(self.path.alpha_prefix())
    }

    /// Renders `l.ccc.sss.NNN[.suffix]`.
    pub fn to_mfa(&self) -> String {
        self.render(self.path.numeric_prefix())
    }

    /// Renders in the requested form.
    pub fn render_as(&self, form: AddressForm) -> String {
        match form {
            AddressForm::Hfn => self.to_hfn(),
            AddressForm::Mfa => self.to_mfa(),
        }
    }

    /// Counter key for the sequence allocator.
    pub fn sequence_path(&self) -> SequencePath {
        SequencePath::from_taxonomy_path(&self.path)
    }

    fn render(&self, prefix: String) -> String {
        let mut out = format!("{prefix}.{}", format_sequential(self.sequential));
        if let Some(suffix) = self.suffix.as_deref() {
            out.push('.');
            out.push_str(suffix);
        }
        out
    }
}

/// Left-pads a sequential number to at least three digits.
pub fn format_sequential(sequential: u32) -> String {
    format!("{sequential:03}")
}

/// Checks a file-type suffix without building an address.
pub fn validate_suffix(value: &str) -> TaxonomyResult<()> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TaxonomyError::malformed(
            value,
            "suffix must be non-empty ASCII alphanumeric",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{format_sequential, Address, AddressForm};
    use crate::model::taxonomy::{Layer, TaxonomyEntry, TaxonomyPath};
    use crate::taxonomy::TaxonomyError;

    fn entry(alpha: &str, numeric: u16) -> TaxonomyEntry {
        TaxonomyEntry {
            alpha_code: alpha.to_string(),
            numeric_code: numeric,
            name: alpha.to_string(),
            source_has_explicit_code: true,
            source_has_explicit_numeric_code: true,
            position: 0,
        }
    }

    fn stars_pop_hipster() -> TaxonomyPath {
        TaxonomyPath {
            layer: Layer {
                alpha_code: 'S',
                numeric_code: 2,
                name: "Stars".to_string(),
            },
            category: entry("POP", 1),
            subcategory: entry("HPM", 7),
        }
    }

    #[test]
    fn renders_both_forms_with_suffix() {
        let address = Address::new(stars_pop_hipster(), 42, Some("mp4".to_string()))
            .expect("valid address");
        assert_eq!(address.to_hfn(), "S.POP.HPM.042.mp4");
        assert_eq!(address.to_mfa(), "2.001.007.042.mp4");
        assert_eq!(address.render_as(AddressForm::Mfa), address.to_mfa());
    }

    #[test]
    fn sequential_wider_than_three_digits_is_not_truncated() {
        assert_eq!(format_sequential(1), "001");
        assert_eq!(format_sequential(1234), "1234");
    }

    #[test]
    fn rejects_zero_sequential_and_bad_suffix() {
        let zero = Address::new(stars_pop_hipster(), 0, None).expect_err("zero is invalid");
        assert!(matches!(zero, TaxonomyError::MalformedAddress { .. }));

        let suffix = Address::new(stars_pop_hipster(), 1, Some("m p4".to_string()))
            .expect_err("suffix with space is invalid");
        assert!(matches!(suffix, TaxonomyError::MalformedAddress { .. }));
    }

    #[test]
    fn sequence_path_uses_alpha_codes() {
        let address = Address::new(stars_pop_hipster(), 3, None).expect("valid address");
        assert_eq!(address.sequence_path().to_string(), "S.POP.HPM");
    }
}
