//! HFN / MFA string grammar.
//!
//! # Invariants
//! - Exactly four dot-separated primary segments plus one optional
//!   alphanumeric suffix segment.
//! - Sequential is at least three digits, at least 1, and fits `u32`.
//! - Digits are ASCII `0-9` only.

use crate::model::address::AddressForm;
use crate::taxonomy::{TaxonomyError, TaxonomyResult};
use once_cell::sync::Lazy;
use regex::Regex;

static HFN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z])\.([A-Z]{3})\.([A-Z]{3})\.([0-9]{3,})(?:\.([A-Za-z0-9]+))?$")
        .expect("valid hfn regex")
});
static MFA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2})\.([0-9]{3})\.([0-9]{3})\.([0-9]{3,})(?:\.([A-Za-z0-9]+))?$")
        .expect("valid mfa regex")
});

/// Grammar-checked but not yet resolved address segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAddress<'a> {
    pub form: AddressForm,
    pub layer: &'a str,
    pub category: &'a str,
    pub subcategory: &'a str,
    pub sequential: u32,
    pub suffix: Option<&'a str>,
}

impl AddressForm {
    /// Classifies `input` by grammar; `None` when it matches neither form.
    pub fn detect(input: &str) -> Option<Self> {
        if HFN_RE.is_match(input) {
            Some(Self::Hfn)
        } else if MFA_RE.is_match(input) {
            Some(Self::Mfa)
        } else {
            None
        }
    }
}

/// Splits an HFN string into its segments.
pub fn parse_hfn(input: &str) -> TaxonomyResult<RawAddress<'_>> {
    parse_with(&HFN_RE, AddressForm::Hfn, input, "expected L.CCC.SSS.NNN[.suffix]")
}

/// Splits an MFA string into its segments.
pub fn parse_mfa(input: &str) -> TaxonomyResult<RawAddress<'_>> {
    parse_with(&MFA_RE, AddressForm::Mfa, input, "expected l.ccc.sss.NNN[.suffix]")
}

/// Splits a string in whichever form it matches.
pub fn parse_any(input: &str) -> TaxonomyResult<RawAddress<'_>> {
    match AddressForm::detect(input) {
        Some(AddressForm::Hfn) => parse_hfn(input),
        Some(AddressForm::Mfa) => parse_mfa(input),
        None => Err(TaxonomyError::malformed(
            input,
            "matches neither the HFN nor the MFA grammar",
        )),
    }
}

fn parse_with<'a>(
    re: &Regex,
    form: AddressForm,
    input: &'a str,
    expected: &'static str,
) -> TaxonomyResult<RawAddress<'a>> {
    let caps = re
        .captures(input)
        .ok_or_else(|| TaxonomyError::malformed(input, expected))?;
    let segment = |index: usize| caps.get(index).map_or("", |m| m.as_str());

    let sequential = segment(4)
        .parse::<u32>()
        .map_err(|_| TaxonomyError::malformed(input, "sequential does not fit 32 bits"))?;
    if sequential == 0 {
        return Err(TaxonomyError::malformed(
            input,
            "sequential must be at least 1",
        ));
    }

    Ok(RawAddress {
        form,
        layer: segment(1),
        category: segment(2),
        subcategory: segment(3),
        sequential,
        suffix: caps.get(5).map(|m| m.as_str()),
    })
}
