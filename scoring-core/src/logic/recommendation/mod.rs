//! Recommendation Module - Outreach scripts
//!
//! Maps the strongest positive driver to a templated call script.
//! Kept apart from attribution so the table can be swapped freely.

pub mod rules;

pub use rules::{humanize_feature, RuleTable, ScriptRule};
