//! Model status / reload handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use leadscore_core::{EngineStatus, ScoringService};

use crate::{AppError, AppResult};

pub async fn status(State(scoring): State<Arc<ScoringService>>) -> Json<EngineStatus> {
    Json(scoring.status())
}

/// Re-read artifacts from disk. On failure the service stays unavailable
/// until the next successful reload.
pub async fn reload(State(scoring): State<Arc<ScoringService>>) -> AppResult<Json<EngineStatus>> {
    let service = Arc::clone(&scoring);
    let metadata = tokio::task::spawn_blocking(move || service.reload())
        .await?
        .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

    tracing::info!(
        "Model reloaded: {} trees, checksum {}",
        metadata.tree_count,
        metadata.checksum
    );

    Ok(Json(scoring.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscore_core::ArtifactStore;

    #[test]
    fn test_status_reports_unavailable_reason() {
        let scoring = Arc::new(ScoringService::load(ArtifactStore::new(
            "/nonexistent/leadscore-artifacts",
        )));

        let Json(engine) = tokio_test::block_on(status(State(scoring)));
        assert!(!engine.ready);
        assert!(engine.model.is_none());
        assert!(engine.reason.is_some());
        assert_eq!(engine.inference_count, 0);
        assert_eq!(engine.artifacts_dir, "/nonexistent/leadscore-artifacts");
    }
}
