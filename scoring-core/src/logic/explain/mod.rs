//! Explain Module - Per-prediction attribution
//!
//! Signed contribution per schema feature (TreeSHAP) and the ranking
//! that picks the positive drivers.

pub mod engine;
pub mod types;

pub use engine::Attributor;
pub use types::{Attribution, FeatureContribution};
