//! Lead handlers - single prediction, CSV upload, dashboard listing

use std::str::FromStr;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use leadscore_core::{BatchSummary, LeadLabel, RowFailure};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateLead, Lead, LeadFilter, UpdateLeadStatus};
use crate::{ingest, AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub inserted: u64,
    pub summary: BatchSummary,
    pub failures: Vec<RowFailure>,
}

/// Score one lead and store it
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<CreateLead>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    req.validate()?;

    let record = req.to_record();
    let insight = state.scoring.score_lead(&record)?;
    let lead = Lead::create(&state.pool, &record, &insight, "api").await?;

    tracing::debug!("Lead {} scored {:.4} ({})", lead.id, lead.score, lead.label);
    Ok((StatusCode::CREATED, Json(lead)))
}

/// Score every row of an uploaded CSV and store the accepted ones
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut data = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_lowercase();
        if !file_name.ends_with(".csv") {
            return Err(AppError::ValidationError("Only .csv files are accepted".to_string()));
        }
        data = Some(field.bytes().await?);
        break;
    }
    let data = data.ok_or_else(|| AppError::ValidationError("Missing 'file' field".to_string()))?;

    let rows = ingest::parse_csv(&data)?;
    let scoring = state.scoring.clone();
    let outcome = tokio::task::spawn_blocking(move || scoring.score_batch(rows)).await??;

    let inserted = Lead::create_batch(&state.pool, &outcome.accepted, "csv").await?;
    tracing::info!(
        "CSV upload: {} inserted, {} failed, {} potential",
        inserted,
        outcome.summary.total_failed,
        outcome.summary.potential_count
    );

    Ok(Json(UploadResponse {
        message: format!("Processed {} leads", outcome.summary.total_processed),
        inserted,
        summary: outcome.summary,
        failures: outcome.failures,
    }))
}

/// List stored leads, best first
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> AppResult<Json<Vec<Lead>>> {
    if let Some(label) = &filter.label {
        LeadLabel::from_str(label).map_err(AppError::ValidationError)?;
    }

    let leads = Lead::list(&state.pool, &filter).await?;
    Ok(Json(leads))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Lead>> {
    let lead = Lead::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    Ok(Json(lead))
}

/// Mark a lead as contacted / add call notes
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadStatus>,
) -> AppResult<Json<Lead>> {
    req.validate()?;

    let lead = Lead::update_status(&state.pool, id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    Ok(Json(lead))
}
