//! # SV-03 Deny-Word Table
//!
//! Owns the `deny-words` group table: for every word, whether the filter
//! replaces it with the redaction marker.
//!
//! Words are raw keys. No case folding, trimming or punctuation stripping is
//! applied, so `bad` and `Bad` are independent entries.

pub mod domain;
pub mod service;

pub use domain::apply;
pub use service::{deny_word_group, DenyWordProcessor};
