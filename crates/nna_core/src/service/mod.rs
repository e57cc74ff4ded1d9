//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate cache lookups and sequence issuance into use-case APIs.
//! - Keep CLI and other front ends decoupled from storage details.

pub mod naming_service;
