//! Remote provider that asks the LLM directly for candidate analyses.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::analysis::backend::RawAnalysisProvider;
use crate::analysis::prompts::{analysis_system_prompt, build_analysis_prompt};
use crate::errors::AnalysisError;
use crate::llm_client::{LlmClient, MODEL};
use crate::models::resume::AnalysisBatch;

pub struct LlmAnalysisProvider {
    llm: LlmClient,
}

impl LlmAnalysisProvider {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RawAnalysisProvider for LlmAnalysisProvider {
    async fn fetch(&self, batch: &AnalysisBatch) -> Result<Value, AnalysisError> {
        info!(
            "Requesting LLM analysis of {} resumes (model: {}, jd length: {})",
            batch.resumes.len(),
            MODEL,
            batch.job_description.len()
        );
        let prompt = build_analysis_prompt(batch);
        let value: Value = self
            .llm
            .call_json(&prompt, &analysis_system_prompt())
            .await?;
        Ok(value)
    }
}
