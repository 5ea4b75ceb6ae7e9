//! Remote Analysis Adapter: forwards a batch to an external analysis endpoint over
//! HTTPS and hands the raw JSON back for normalization.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::backend::RawAnalysisProvider;
use crate::analysis::normalizer::error_message;
use crate::errors::AnalysisError;
use crate::models::resume::{AnalysisBatch, ProviderRequest};

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    endpoint: String,
}

impl WebhookClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RawAnalysisProvider for WebhookClient {
    async fn fetch(&self, batch: &AnalysisBatch) -> Result<Value, AnalysisError> {
        debug!(
            "Posting {} resumes to analysis webhook {}",
            batch.resumes.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProviderRequest::from(batch))
            .send()
            .await
            .map_err(|e| AnalysisError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::ProviderUnavailable(e.to_string()))?;

        classify_response(status, &body)
    }
}

/// Maps a provider status and body to the raw JSON payload or a typed failure.
pub fn classify_response(status: StatusCode, body: &str) -> Result<Value, AnalysisError> {
    let parsed = serde_json::from_str::<Value>(body);

    if status.is_success() {
        return parsed.map_err(|e| {
            AnalysisError::ProviderMalformedResponse(format!("response body is not JSON: {e}"))
        });
    }

    let reported = parsed
        .ok()
        .and_then(|v| v.get("error").filter(|e| !e.is_null()).map(error_message));
    warn!("Analysis webhook returned {}: {}", status, body);

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(AnalysisError::ProviderRateLimited(
            reported.unwrap_or_else(|| "Rate limit exceeded. Please try again later.".to_string()),
        )),
        StatusCode::PAYMENT_REQUIRED => Err(AnalysisError::ProviderQuotaExhausted(
            reported.unwrap_or_else(|| "Analysis credits exhausted.".to_string()),
        )),
        _ => match reported {
            Some(message) => Err(AnalysisError::ProviderReportedError {
                status: Some(status.as_u16()),
                message,
            }),
            None if status.is_server_error() => Err(AnalysisError::ProviderUnavailable(format!(
                "provider returned status {}",
                status.as_u16()
            ))),
            None => Err(AnalysisError::ProviderReportedError {
                status: Some(status.as_u16()),
                message: format!("provider returned status {}", status.as_u16()),
            }),
        },
    }
}
