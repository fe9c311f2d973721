//! Batch Orchestrator - per-row isolation over bulk input
//!
//! Each row runs the full pipeline as one unit. A failing row becomes a
//! `RowFailure` tagged with its original position; the loop always reaches
//! the end of the input.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::logic::features::RawLeadRecord;
use crate::logic::model::LeadLabel;
use crate::logic::pipeline::{InferencePipeline, LeadInsight};

/// Accepted row, ready for persistence
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRow {
    pub row: usize, // 0-based position in the input
    pub record: RawLeadRecord,
    pub insight: LeadInsight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_processed: usize,
    pub total_failed: usize,
    pub potential_count: usize,
    /// First failure, for diagnostics
    pub sample_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub accepted: Vec<ScoredRow>,
    pub failures: Vec<RowFailure>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    fn accept(&mut self, row: usize, record: RawLeadRecord, insight: LeadInsight) {
        self.summary.total_processed += 1;
        if insight.label() == LeadLabel::Potential {
            self.summary.potential_count += 1;
        }
        self.accepted.push(ScoredRow { row, record, insight });
    }

    fn reject(&mut self, row: usize, error: &ScoringError) {
        log::warn!("Skipping row {}: {}", row, error);
        let message = error.to_string();
        self.summary.total_failed += 1;
        if self.summary.sample_error.is_none() {
            self.summary.sample_error = Some(format!("row {}: {}", row, message));
        }
        self.failures.push(RowFailure { row, error: message });
    }
}

/// Score every row. Rows that failed upstream (ingestion) are counted as
/// failures at their position.
pub fn run_batch<I>(pipeline: &InferencePipeline, rows: I) -> BatchOutcome
where
    I: IntoIterator<Item = Result<RawLeadRecord, ScoringError>>,
{
    let mut outcome = BatchOutcome::default();

    for (row, input) in rows.into_iter().enumerate() {
        let scored = input.and_then(|record| pipeline.run(&record).map(|insight| (record, insight)));
        match scored {
            Ok((record, insight)) => outcome.accept(row, record, insight),
            Err(e) => outcome.reject(row, &e),
        }
    }

    let summary = &outcome.summary;
    log::info!(
        "Batch done: {} processed, {} failed, {} potential",
        summary.total_processed,
        summary.total_failed,
        summary.potential_count
    );

    outcome
}
