//! Lead Scoring Core - Inference Pipeline
//!
//! Raw lead record → feature reconstruction → forest scoring →
//! TreeSHAP attribution → outreach script.
//!
//! ## Layout
//! - `logic/features/` - schema registry, raw records, reconstruction
//! - `logic/model/` - XGBoost forest loading and scoring
//! - `logic/explain/` - per-prediction contribution values
//! - `logic/recommendation/` - script rule table
//! - `logic/batch.rs` - per-row isolation over bulk input
//! - `logic/service.rs` - load-once service with degraded state

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ArtifactLoadError, ScoringError};
pub use logic::artifacts::{ArtifactStore, LoadedArtifacts, ModelMetadata};
pub use logic::batch::{run_batch, BatchOutcome, BatchSummary, RowFailure, ScoredRow};
pub use logic::explain::{Attribution, FeatureContribution};
pub use logic::features::{
    normalize_field_name, FeatureSchema, FeatureVector, PreprocessingConfig, RawLeadRecord, RawValue,
};
pub use logic::model::{LeadLabel, PredictionResult};
pub use logic::pipeline::{InferencePipeline, LeadInsight};
pub use logic::recommendation::RuleTable;
pub use logic::service::{EngineStatus, ScoringService};
