//! Inference Pipeline - one lead, end to end
//!
//! Reconstruct → score → attribute → recommend, as a single unit that either
//! yields a complete `LeadInsight` or the first error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::logic::artifacts::{LoadedArtifacts, ModelMetadata};
use crate::logic::explain::{Attribution, Attributor, FeatureContribution};
use crate::logic::features::{FeatureReconstructor, FeatureSchema, FeatureVector, RawLeadRecord};
use crate::logic::model::{LeadLabel, PredictionResult, Scorer};
use crate::logic::recommendation::RuleTable;

/// Everything persistence needs for one scored lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadInsight {
    pub prediction: PredictionResult,
    pub attribution: Attribution,
    pub top_contributors: Vec<FeatureContribution>,
    pub recommendation: String,
}

impl LeadInsight {
    pub fn score(&self) -> f64 {
        self.prediction.score
    }

    pub fn label(&self) -> LeadLabel {
        self.prediction.label
    }

    /// Compact explanation stored with the lead
    pub fn explanation(&self) -> serde_json::Value {
        serde_json::json!({
            "top_contributors": self.top_contributors,
            "bias": self.attribution.bias,
            "margin": self.prediction.margin,
        })
    }
}

#[derive(Debug)]
pub struct InferencePipeline {
    reconstructor: FeatureReconstructor,
    scorer: Scorer,
    attributor: Attributor,
    rules: Arc<RuleTable>,
    metadata: ModelMetadata,
}

impl InferencePipeline {
    pub fn new(artifacts: LoadedArtifacts) -> Self {
        let hash = artifacts.schema.layout_hash();
        Self {
            reconstructor: FeatureReconstructor::new(artifacts.schema, artifacts.config),
            scorer: Scorer::new(Arc::clone(&artifacts.forest), hash),
            attributor: Attributor::new(artifacts.forest, hash),
            rules: artifacts.rules,
            metadata: artifacts.metadata,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        self.reconstructor.schema()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn reconstruct(&self, record: &RawLeadRecord) -> Result<FeatureVector> {
        self.reconstructor.reconstruct(record)
    }

    pub fn run(&self, record: &RawLeadRecord) -> Result<LeadInsight> {
        let vector = self.reconstructor.reconstruct(record)?;
        let prediction = self.scorer.predict(&vector)?;
        let attribution = self.attributor.explain(&vector)?;
        let top_contributors = attribution.top_drivers();
        let recommendation = self.rules.generate_for(&top_contributors);

        Ok(LeadInsight {
            prediction,
            attribution,
            top_contributors,
            recommendation,
        })
    }
}
