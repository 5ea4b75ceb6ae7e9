//! Analysis backends: one contract, interchangeable implementations.
//!
//! `HeuristicBackend` analyses locally and cannot fail. `RemoteBackend` wraps any
//! `RawAnalysisProvider` (webhook, LLM) and normalizes whatever it returns.
//! `AppState` holds a [`Backends`] registry and callers pick one per run.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::analysis::heuristic::HeuristicAnalyzer;
use crate::analysis::normalizer::{normalize_response, RunContext};
use crate::analysis::progress::ProgressReporter;
use crate::errors::AnalysisError;
use crate::models::candidate::CandidateAnalysis;
use crate::models::resume::AnalysisBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Heuristic,
    Webhook,
    Llm,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendKind::Heuristic => "heuristic",
            BackendKind::Webhook => "webhook",
            BackendKind::Llm => "llm",
        };
        f.write_str(label)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "local" => Ok(BackendKind::Heuristic),
            "webhook" => Ok(BackendKind::Webhook),
            "llm" => Ok(BackendKind::Llm),
            other => Err(format!(
                "unknown analysis backend '{other}' (expected heuristic, webhook or llm)"
            )),
        }
    }
}

/// Produces one unranked `CandidateAnalysis` per analysed resume.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn analyze(
        &self,
        batch: &AnalysisBatch,
        progress: &ProgressReporter,
    ) -> Result<Vec<CandidateAnalysis>, AnalysisError>;
}

/// A remote service returning provider-shaped JSON. The single suspension point of a run.
#[async_trait]
pub trait RawAnalysisProvider: Send + Sync {
    async fn fetch(&self, batch: &AnalysisBatch) -> Result<Value, AnalysisError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicBackend
// ────────────────────────────────────────────────────────────────────────────

/// Runs the heuristic analyzer over every resume. With a seed, runs are reproducible;
/// otherwise the generator is seeded from the OS.
pub struct HeuristicBackend {
    analyzer: HeuristicAnalyzer,
    seed: Option<u64>,
}

impl HeuristicBackend {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            analyzer: HeuristicAnalyzer,
            seed,
        }
    }
}

#[async_trait]
impl AnalysisBackend for HeuristicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Heuristic
    }

    async fn analyze(
        &self,
        batch: &AnalysisBatch,
        progress: &ProgressReporter,
    ) -> Result<Vec<CandidateAnalysis>, AnalysisError> {
        let mut run_rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let total = batch.resumes.len().max(1);
        progress.report(10, "Extracting candidate details");

        let mut records = Vec::with_capacity(batch.resumes.len());
        for (index, resume) in batch.resumes.iter().enumerate() {
            // Each resume gets its own generator so its result does not depend on the others'.
            let mut rng = StdRng::seed_from_u64(run_rng.random());
            let record = self
                .analyzer
                .analyze(resume, &batch.job_description, &mut rng);
            debug!(
                "Heuristic analysis of '{}' scored {}",
                resume.name, record.fit_score
            );
            records.push(record);

            let percent = 10 + 80 * (index + 1) / total;
            progress.report(percent as u8, &format!("Analyzed {}", resume.name));
        }

        Ok(records)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RemoteBackend
// ────────────────────────────────────────────────────────────────────────────

/// Sends the whole batch to a provider in one call, then normalizes the reply.
/// All-or-nothing: any provider or shape failure aborts the run.
pub struct RemoteBackend<P> {
    kind: BackendKind,
    provider: P,
}

impl<P: RawAnalysisProvider> RemoteBackend<P> {
    pub fn new(kind: BackendKind, provider: P) -> Self {
        Self { kind, provider }
    }
}

#[async_trait]
impl<P: RawAnalysisProvider> AnalysisBackend for RemoteBackend<P> {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn analyze(
        &self,
        batch: &AnalysisBatch,
        progress: &ProgressReporter,
    ) -> Result<Vec<CandidateAnalysis>, AnalysisError> {
        progress.report(10, "Preparing data for analysis");
        let run = RunContext::new(batch);

        progress.report(30, "Sending to analysis provider");
        let body = self.provider.fetch(batch).await?;

        progress.report(70, "Processing results");
        let records = normalize_response(body, &run)?;

        progress.report(90, "Formatting candidates");
        Ok(records)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

/// The backends available to callers. Heuristic is always present.
#[derive(Clone)]
pub struct Backends {
    pub default_kind: BackendKind,
    heuristic: Arc<dyn AnalysisBackend>,
    webhook: Option<Arc<dyn AnalysisBackend>>,
    llm: Option<Arc<dyn AnalysisBackend>>,
}

impl Backends {
    pub fn new(default_kind: BackendKind, heuristic: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            default_kind,
            heuristic,
            webhook: None,
            llm: None,
        }
    }

    pub fn with_webhook(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.webhook = Some(backend);
        self
    }

    pub fn with_llm(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.llm = Some(backend);
        self
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn AnalysisBackend>> {
        match kind {
            BackendKind::Heuristic => Some(Arc::clone(&self.heuristic)),
            BackendKind::Webhook => self.webhook.clone(),
            BackendKind::Llm => self.llm.clone(),
        }
    }

    pub fn heuristic(&self) -> Arc<dyn AnalysisBackend> {
        Arc::clone(&self.heuristic)
    }

    pub fn available(&self) -> Vec<BackendKind> {
        [BackendKind::Heuristic, BackendKind::Webhook, BackendKind::Llm]
            .into_iter()
            .filter(|k| self.get(*k).is_some())
            .collect()
    }
}
