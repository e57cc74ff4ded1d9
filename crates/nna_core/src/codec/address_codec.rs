//! HFN ↔ MFA conversion over one loaded taxonomy tree.
//!
//! # Responsibility
//! - Parse either address form into a resolved `Address`.
//! - Convert between forms without guessing missing taxonomy entries.
//!
//! # Invariants
//! - Pure: output depends only on input and the borrowed tree.
//! - HFN segments resolve by alphabetic code only, MFA segments by numeric
//!   code only; neither falls through to name matching.

use super::grammar::{parse_any, parse_hfn, parse_mfa, RawAddress};
use crate::model::address::{Address, AddressForm};
use crate::taxonomy::{CodeKey, TaxonomyError, TaxonomyResult, TaxonomyTree};

/// Address codec bound to one taxonomy version.
#[derive(Debug, Clone, Copy)]
pub struct AddressCodec<'tree> {
    tree: &'tree TaxonomyTree,
}

impl<'tree> AddressCodec<'tree> {
    pub fn new(tree: &'tree TaxonomyTree) -> Self {
        Self { tree }
    }

    /// Converts `L.CCC.SSS.NNN[.suffix]` to `l.ccc.sss.NNN[.suffix]`.
    ///
    /// The sequential value and suffix are kept, but the sequential is
    /// re-rendered with canonical padding (`0007` becomes `007`), so the
    /// output can differ textually from the input.
    ///
    /// # Errors
    /// - `MalformedAddress` when `hfn` does not match the HFN grammar.
    /// - `NotFound` when any segment does not resolve.
    pub fn to_mfa(&self, hfn: &str) -> TaxonomyResult<String> {
        Ok(self.parse_hfn(hfn)?.to_mfa())
    }

    /// Converts `l.ccc.sss.NNN[.suffix]` to `L.CCC.SSS.NNN[.suffix]`.
    ///
    /// Entries without an explicit alphabetic code render their synthesized
    /// code. The sequential is re-rendered with canonical padding, as in
    /// `to_mfa`.
    pub fn to_hfn(&self, mfa: &str) -> TaxonomyResult<String> {
        Ok(self.parse_mfa(mfa)?.to_hfn())
    }

    /// Parses and resolves an HFN string.
    pub fn parse_hfn(&self, hfn: &str) -> TaxonomyResult<Address> {
        self.resolve(parse_hfn(hfn)?)
    }

    /// Parses and resolves an MFA string.
    pub fn parse_mfa(&self, mfa: &str) -> TaxonomyResult<Address> {
        self.resolve(parse_mfa(mfa)?)
    }

    /// Parses and resolves a string in either form.
    pub fn parse(&self, input: &str) -> TaxonomyResult<Address> {
        self.resolve(parse_any(input)?)
    }

    /// Renders `input` (either form) in the requested form.
    pub fn convert(&self, input: &str, target: AddressForm) -> TaxonomyResult<String> {
        Ok(self.parse(input)?.render_as(target))
    }

    fn resolve(&self, raw: RawAddress<'_>) -> TaxonomyResult<Address> {
        let path = match raw.form {
            AddressForm::Hfn => self.tree.resolve_codes(
                CodeKey::Alpha(raw.layer),
                CodeKey::Alpha(raw.category),
                CodeKey::Alpha(raw.subcategory),
            )?,
            AddressForm::Mfa => self.tree.resolve_codes(
                numeric_key(raw.layer)?,
                numeric_key(raw.category)?,
                numeric_key(raw.subcategory)?,
            )?,
        };
        Address::new(path, raw.sequential, raw.suffix.map(str::to_string))
    }
}

fn numeric_key(segment: &str) -> TaxonomyResult<CodeKey<'static>> {
    segment
        .parse::<u16>()
        .map(CodeKey::Numeric)
        .map_err(|_| TaxonomyError::malformed(segment, "numeric segment is not a number"))
}

#[cfg(test)]
mod tests {
    use super::AddressCodec;
    use crate::model::address::AddressForm;
    use crate::model::taxonomy::TaxonomyLevel;
    use crate::taxonomy::{BuiltinSnapshotSource, TaxonomyError, TaxonomySource, TaxonomyTree};

    fn builtin() -> TaxonomyTree {
        BuiltinSnapshotSource
            .load_tree()
            .expect("builtin snapshot must load")
    }

    #[test]
    fn converts_known_addresses() {
        let tree = builtin();
        let codec = AddressCodec::new(&tree);
        assert_eq!(codec.to_mfa("S.POP.HPM.001").expect("hfn"), "2.001.007.001");
        assert_eq!(codec.to_hfn("5.004.003.001").expect("mfa"), "W.BCH.SUN.001");
    }

    #[test]
    fn carries_suffix_and_wide_sequential() {
        let tree = builtin();
        let codec = AddressCodec::new(&tree);
        assert_eq!(
            codec.to_mfa("R.LIC.SYN.12345.pdf").expect("hfn"),
            "10.001.002.12345.pdf"
        );
        assert_eq!(
            codec.to_hfn("10.001.002.12345.pdf").expect("mfa"),
            "R.LIC.SYN.12345.pdf"
        );
    }

    #[test]
    fn synthesized_codes_convert_both_ways() {
        let tree = builtin();
        let codec = AddressCodec::new(&tree);
        assert_eq!(codec.to_hfn("3.002.002.004").expect("mfa"), "L.DAC.STS.004");
        assert_eq!(codec.to_mfa("L.DAC.STS.004").expect("hfn"), "3.002.002.004");
    }

    #[test]
    fn unknown_segments_are_not_found_without_fallback() {
        let tree = builtin();
        let codec = AddressCodec::new(&tree);

        let err = codec.to_mfa("S.POP.ZZZ.001").expect_err("unknown subcategory");
        assert_eq!(
            err,
            TaxonomyError::NotFound {
                level: TaxonomyLevel::Subcategory,
                scope: "S.POP".to_string(),
                input: "ZZZ".to_string(),
            }
        );

        let err = codec.to_hfn("2.999.001.001").expect_err("unknown category");
        assert!(matches!(
            err,
            TaxonomyError::NotFound {
                level: TaxonomyLevel::Category,
                ..
            }
        ));

        let err = codec.to_hfn("11.001.001.001").expect_err("unknown layer");
        assert!(matches!(
            err,
            TaxonomyError::NotFound {
                level: TaxonomyLevel::Layer,
                ..
            }
        ));
    }

    #[test]
    fn wrong_form_is_malformed() {
        let tree = builtin();
        let codec = AddressCodec::new(&tree);
        assert!(matches!(
            codec.to_mfa("2.001.007.001"),
            Err(TaxonomyError::MalformedAddress { .. })
        ));
        assert!(matches!(
            codec.to_hfn("S.POP.HPM.001"),
            Err(TaxonomyError::MalformedAddress { .. })
        ));
    }

    #[test]
    fn non_canonical_padding_renders_canonically() {
        let tree = builtin();
        let codec = AddressCodec::new(&tree);
        assert_eq!(codec.to_mfa("S.POP.HPM.0007").expect("hfn"), "2.001.007.007");
        assert_eq!(
            codec.convert("02.001.007.7000", AddressForm::Hfn).expect("mfa"),
            "S.POP.HPM.7000"
        );
        assert_eq!(
            codec.to_hfn("2.001.007.00042.mp3").expect("mfa"),
            "S.POP.HPM.042.mp3"
        );
    }
}
