//! Axum route handlers for the Analysis API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::analysis::backend::BackendKind;
use crate::analysis::export::to_csv;
use crate::analysis::pipeline::{run_with_fallback, RunOutcome};
use crate::analysis::progress::{ProgressReporter, ProgressUpdate};
use crate::errors::AppError;
use crate::models::candidate::CandidateAnalysis;
use crate::models::resume::{AnalysisBatch, ResumeDocument, ResumeInput};
use crate::state::AppState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const CSV_DISPOSITION: &str = "attachment; filename=\"candidate-analysis.csv\"";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resumes: Vec<ResumeInput>,
    /// Overrides the configured default backend for this run.
    pub backend: Option<BackendKind>,
    #[serde(default)]
    pub allow_fallback: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub candidates: Vec<CandidateAnalysis>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
///
/// Analyses every resume against the job description and returns the ranked candidates.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<RunOutcome>, AppError> {
    Ok(Json(analyze(&state, request).await?))
}

/// POST /api/v1/analyses/csv
///
/// Same as `handle_analyze`, but responds with the ranked list as CSV.
pub async fn handle_analyze_csv(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Response, AppError> {
    let outcome = analyze(&state, request).await?;
    csv_response(&outcome.candidates)
}

/// POST /api/v1/exports/csv
///
/// Serializes already-ranked candidates. Input order is output order.
pub async fn handle_export_csv(Json(request): Json<ExportRequest>) -> Result<Response, AppError> {
    csv_response(&request.candidates)
}

async fn analyze(state: &AppState, request: AnalyzeRequest) -> Result<RunOutcome, AppError> {
    let kind = request.backend.unwrap_or(state.backends.default_kind);
    let backend = state.backends.get(kind).ok_or_else(|| {
        AppError::BackendUnavailable(format!("the {kind} backend is not configured"))
    })?;
    let fallback = request.allow_fallback.then(|| state.backends.heuristic());

    let resumes = request
        .resumes
        .into_iter()
        .map(ResumeDocument::from)
        .collect();
    let batch = AnalysisBatch::new(request.job_description, resumes);

    let progress = ProgressReporter::new(log_progress);
    let outcome = run_with_fallback(backend.as_ref(), fallback.as_deref(), &batch, &progress).await?;
    Ok(outcome)
}

fn log_progress(update: ProgressUpdate) {
    debug!(
        "Analysis progress {}%: {}",
        update.percent_complete, update.step_label
    );
}

fn csv_response(candidates: &[CandidateAnalysis]) -> Result<Response, AppError> {
    let body = to_csv(candidates)?;
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, CSV_DISPOSITION),
        ],
        body,
    )
        .into_response())
}
