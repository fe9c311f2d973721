//! Scoring Service - explicit owner of the loaded artifacts
//!
//! Constructed once at startup and handed to request handlers. Load failures
//! never take the process down: the service stays `Unavailable` and every
//! scoring call reports it until a reload succeeds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::CORE_VERSION;
use crate::error::{ArtifactLoadError, Result, ScoringError};
use crate::logic::artifacts::{ArtifactStore, ModelMetadata};
use crate::logic::batch::{run_batch, BatchOutcome};
use crate::logic::features::RawLeadRecord;
use crate::logic::pipeline::{InferencePipeline, LeadInsight};

enum EngineState {
    Ready(Arc<InferencePipeline>),
    Unavailable(String),
}

/// Engine Status for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub ready: bool,
    pub reason: Option<String>,
    pub artifacts_dir: String,
    pub model: Option<ModelMetadata>,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
    pub core_version: String,
}

pub struct ScoringService {
    store: ArtifactStore,
    state: RwLock<EngineState>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl ScoringService {
    /// Always returns a service; check `is_ready()` or `status()`
    pub fn load(store: ArtifactStore) -> Self {
        let service = Self {
            store,
            state: RwLock::new(EngineState::Unavailable("not loaded".to_string())),
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        };
        if let Err(e) = service.reload() {
            log::warn!("Scoring service starting unavailable: {}", e);
        }
        service
    }

    /// Re-read the artifact directory and swap the pipeline.
    ///
    /// A failed reload leaves the service unavailable; it never keeps
    /// serving an artifact set that no longer loads.
    pub fn reload(&self) -> std::result::Result<ModelMetadata, ArtifactLoadError> {
        match self.store.load() {
            Ok(artifacts) => {
                let pipeline = InferencePipeline::new(artifacts);
                let metadata = pipeline.metadata().clone();
                *self.state.write() = EngineState::Ready(Arc::new(pipeline));
                Ok(metadata)
            }
            Err(e) => {
                log::error!("Failed to load scoring artifacts: {}", e);
                *self.state.write() = EngineState::Unavailable(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), EngineState::Ready(_))
    }

    /// Snapshot of the current pipeline; reloads do not affect it
    pub fn pipeline(&self) -> Result<Arc<InferencePipeline>> {
        match &*self.state.read() {
            EngineState::Ready(pipeline) => Ok(Arc::clone(pipeline)),
            EngineState::Unavailable(reason) => Err(ScoringError::ModelUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    pub fn score_lead(&self, record: &RawLeadRecord) -> Result<LeadInsight> {
        let pipeline = self.pipeline()?;
        let start = Instant::now();
        let result = pipeline.run(record);
        self.record_latency(start, 1);
        result
    }

    /// Fails up front when unavailable; otherwise never fails as a whole
    pub fn score_batch<I>(&self, rows: I) -> Result<BatchOutcome>
    where
        I: IntoIterator<Item = std::result::Result<RawLeadRecord, ScoringError>>,
    {
        let pipeline = self.pipeline()?;
        let start = Instant::now();
        let outcome = run_batch(&pipeline, rows);
        let rows = outcome.summary.total_processed + outcome.summary.total_failed;
        self.record_latency(start, rows as u64);
        Ok(outcome)
    }

    pub fn score_records(&self, records: Vec<RawLeadRecord>) -> Result<BatchOutcome> {
        self.score_batch(records.into_iter().map(Ok))
    }

    pub fn status(&self) -> EngineStatus {
        let (ready, reason, model) = match &*self.state.read() {
            EngineState::Ready(pipeline) => (true, None, Some(pipeline.metadata().clone())),
            EngineState::Unavailable(reason) => (false, Some(reason.clone()), None),
        };

        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        EngineStatus {
            ready,
            reason,
            artifacts_dir: self.store.dir().display().to_string(),
            model,
            avg_latency_ms: avg,
            inference_count: count,
            core_version: CORE_VERSION.to_string(),
        }
    }

    fn record_latency(&self, start: Instant, rows: u64) {
        if rows == 0 {
            return;
        }
        let elapsed = start.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(rows, Ordering::Relaxed);
    }
}
