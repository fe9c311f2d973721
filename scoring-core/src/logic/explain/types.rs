use serde::{Deserialize, Serialize};

use crate::constants::{NO_POSITIVE_DRIVER, TOP_CONTRIBUTOR_LIMIT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: f64, // signed, margin units
}

impl FeatureContribution {
    pub fn new(feature: impl Into<String>, contribution: f64) -> Self {
        Self {
            feature: feature.into(),
            contribution,
        }
    }

    /// Zero-valued stand-in used when nothing pushes the score up
    pub fn placeholder() -> Self {
        Self::new(NO_POSITIVE_DRIVER, 0.0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.feature == NO_POSITIVE_DRIVER
    }
}

/// One signed value per schema feature, plus the bias.
///
/// `bias + Σ contributions` equals the prediction's margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub contributions: Vec<FeatureContribution>,
    pub bias: f64,
}

impl Attribution {
    pub fn new(contributions: Vec<FeatureContribution>, bias: f64) -> Self {
        Self { contributions, bias }
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.contribution)
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Reconstructed model margin
    pub fn margin(&self) -> f64 {
        self.bias + self.contributions.iter().map(|c| c.contribution).sum::<f64>()
    }

    /// All features, contribution DESC; ties keep schema order
    pub fn ranked(&self) -> Vec<FeatureContribution> {
        let mut ranked = self.contributions.clone();
        ranked.sort_by(|a, b| {
            b.contribution
                .partial_cmp(&a.contribution)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Positive drivers, highest first, at most `limit`.
    ///
    /// Never empty: falls back to the placeholder driver.
    pub fn top_contributors(&self, limit: usize) -> Vec<FeatureContribution> {
        let mut top: Vec<_> = self
            .ranked()
            .into_iter()
            .filter(|c| c.contribution > 0.0)
            .take(limit)
            .collect();

        if top.is_empty() {
            top.push(FeatureContribution::placeholder());
        }
        top
    }

    pub fn top_drivers(&self) -> Vec<FeatureContribution> {
        self.top_contributors(TOP_CONTRIBUTOR_LIMIT)
    }
}
