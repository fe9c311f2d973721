//! Inference Engine - forest scoring
//!
//! Runs the frozen forest over an aligned feature vector.
//! Deterministic: same vector, same artifact, same result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::forest::{sigmoid, Forest};
use super::threshold::LeadLabel;
use crate::error::{Result, ScoringError};
use crate::logic::features::FeatureVector;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Prediction output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub score: f64,      // positive-class probability, 0.0 - 1.0
    pub label: LeadLabel,
    pub margin: f64,     // log-odds before the sigmoid
}

// ============================================================================
// SCORER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Scorer {
    forest: Arc<Forest>,
    layout_hash: u32,
}

impl Scorer {
    /// `layout_hash` is the hash of the schema the forest was validated against
    pub fn new(forest: Arc<Forest>, layout_hash: u32) -> Self {
        Self { forest, layout_hash }
    }

    pub fn forest(&self) -> &Arc<Forest> {
        &self.forest
    }

    /// Score one aligned vector
    pub fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult> {
        if vector.layout_hash() != self.layout_hash {
            return Err(ScoringError::LayoutMismatch {
                expected: self.layout_hash,
                actual: vector.layout_hash(),
            });
        }

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Scoring vector: {}", vector.to_log_entry());
        }

        let margin = self.forest.margin(vector.view());
        let score = sigmoid(margin).clamp(0.0, 1.0);

        log::debug!("Scored lead: margin={:.4} score={:.4}", margin, score);

        Ok(PredictionResult {
            score,
            label: LeadLabel::from_score(score),
            margin,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
