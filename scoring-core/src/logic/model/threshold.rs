//! Label Threshold
//!
//! The Potential / Non-Potential cut is a policy constant, not a per-call
//! knob. Scores at exactly the threshold count as Potential.

use serde::{Deserialize, Serialize};

use crate::constants::POTENTIAL_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadLabel {
    #[serde(rename = "Potential")]
    Potential,
    #[serde(rename = "Non-Potential")]
    NonPotential,
}

impl LeadLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= POTENTIAL_THRESHOLD {
            LeadLabel::Potential
        } else {
            LeadLabel::NonPotential
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadLabel::Potential => "Potential",
            LeadLabel::NonPotential => "Non-Potential",
        }
    }

    pub fn is_potential(&self) -> bool {
        matches!(self, LeadLabel::Potential)
    }
}

impl std::fmt::Display for LeadLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Potential" => Ok(LeadLabel::Potential),
            "Non-Potential" => Ok(LeadLabel::NonPotential),
            other => Err(format!("unknown lead label '{}'", other)),
        }
    }
}
