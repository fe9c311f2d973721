//! Model Module - Frozen classifier
//!
//! XGBoost JSON forest, scorer and the fixed label threshold.

pub mod forest;
pub mod inference;
pub mod threshold;

// Re-export common types
pub use forest::{Forest, Node, Tree};
pub use inference::{PredictionResult, Scorer};
pub use threshold::LeadLabel;
