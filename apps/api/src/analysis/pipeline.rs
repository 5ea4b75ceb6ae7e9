//! One analysis run: validate the batch, analyse it with the chosen backend, rank.

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::backend::{AnalysisBackend, BackendKind};
use crate::analysis::progress::ProgressReporter;
use crate::analysis::ranker::rank;
use crate::errors::AnalysisError;
use crate::models::candidate::CandidateAnalysis;
use crate::models::resume::AnalysisBatch;

/// Result of a run. `fallback_reason` is set when the requested backend failed
/// and the heuristic backend produced the candidates instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub candidates: Vec<CandidateAnalysis>,
}

/// Rejects batches the pipeline cannot analyse: a blank job description or no resumes.
pub fn validate_batch(batch: &AnalysisBatch) -> Result<(), AnalysisError> {
    if batch.job_description.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(
            "jobDescription cannot be empty".to_string(),
        ));
    }
    if batch.resumes.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "at least one resume is required".to_string(),
        ));
    }
    Ok(())
}

/// Runs `backend` over the batch and returns the ranked candidates.
/// Any backend error aborts the run; no partial list is returned.
pub async fn run_analysis(
    backend: &dyn AnalysisBackend,
    batch: &AnalysisBatch,
    progress: &ProgressReporter,
) -> Result<Vec<CandidateAnalysis>, AnalysisError> {
    validate_batch(batch)?;
    info!(
        "Starting {} analysis of {} resume(s)",
        backend.kind(),
        batch.resumes.len()
    );

    let records = backend.analyze(batch, progress).await?;
    let ranked = rank(records);

    progress.report(100, "Complete");
    info!(
        "{} analysis complete: {} candidate(s), top score {}",
        backend.kind(),
        ranked.len(),
        ranked.first().map(|c| c.fit_score).unwrap_or(0)
    );
    Ok(ranked)
}

/// Like [`run_analysis`], but when `fallback` is given and the primary backend fails
/// with a provider error, the batch is re-run through `fallback`. Invalid input is never
/// retried.
pub async fn run_with_fallback(
    primary: &dyn AnalysisBackend,
    fallback: Option<&dyn AnalysisBackend>,
    batch: &AnalysisBatch,
    progress: &ProgressReporter,
) -> Result<RunOutcome, AnalysisError> {
    match run_analysis(primary, batch, progress).await {
        Ok(candidates) => Ok(RunOutcome {
            backend: primary.kind(),
            fallback_reason: None,
            candidates,
        }),
        Err(e) if e.is_provider_failure() => match fallback {
            Some(fallback) if fallback.kind() != primary.kind() => {
                warn!(
                    "{} backend failed ({}); falling back to {} analysis",
                    primary.kind(),
                    e,
                    fallback.kind()
                );
                let candidates = run_analysis(fallback, batch, &ProgressReporter::silent()).await?;
                progress.report(100, "Complete");
                Ok(RunOutcome {
                    backend: fallback.kind(),
                    fallback_reason: Some(e.to_string()),
                    candidates,
                })
            }
            _ => Err(e),
        },
        Err(e) => Err(e),
    }
}
