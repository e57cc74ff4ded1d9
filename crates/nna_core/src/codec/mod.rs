//! Address grammar and HFN ↔ MFA conversion.
//!
//! # Responsibility
//! - Validate address strings against the HFN and MFA grammars.
//! - Resolve grammar-checked segments through the taxonomy tree.
//!
//! # Invariants
//! - Round trip: for any resolved address `a`,
//!   `to_hfn(to_mfa(a.to_hfn())) == a.to_hfn()` and
//!   `to_mfa(to_hfn(a.to_mfa())) == a.to_mfa()`.

pub mod address_codec;
pub mod grammar;

pub use address_codec::AddressCodec;
pub use grammar::{parse_any, parse_hfn, parse_mfa, RawAddress};
