//! Central Configuration Constants
//!
//! Artifact names and pipeline policy constants.
//! Env helpers fall back to these defaults.

/// Directory holding the frozen artifacts when nothing else is configured
pub const DEFAULT_ARTIFACTS_DIR: &str = "ml_artifacts";

/// XGBoost native JSON model
pub const MODEL_FILE: &str = "model.json";

/// Ordered training-time feature names (JSON array)
pub const FEATURES_FILE: &str = "model_features.json";

/// Versioned rename / reference-category tables (optional)
pub const PREPROCESSING_FILE: &str = "preprocessing.json";

/// Recommendation rule table (optional)
pub const SCRIPTS_FILE: &str = "scripts.json";

/// Positive-class probability at or above which a lead is "Potential"
pub const POTENTIAL_THRESHOLD: f64 = 0.5;

/// Maximum number of positive drivers handed to the recommendation layer
pub const TOP_CONTRIBUTOR_LIMIT: usize = 3;

/// Placeholder driver used when no feature pushes the score up
pub const NO_POSITIVE_DRIVER: &str = "no_positive_driver";

/// Crate version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get artifacts directory from environment or use default
pub fn get_artifacts_dir() -> String {
    std::env::var("LEADSCORE_ARTIFACTS_DIR")
        .unwrap_or_else(|_| DEFAULT_ARTIFACTS_DIR.to_string())
}
