use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::analysis::backend::{BackendKind, Backends, HeuristicBackend, RemoteBackend};
use crate::analysis::llm_provider::LlmAnalysisProvider;
use crate::analysis::webhook::WebhookClient;
use crate::config::Config;
use crate::llm_client::{self, LlmClient};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Analysis backends. Heuristic always; webhook and LLM when configured.
    pub backends: Arc<Backends>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let backends = build_backends(config)?;
        Ok(Self {
            backends: Arc::new(backends),
        })
    }
}

fn build_backends(config: &Config) -> Result<Backends> {
    let mut backends = Backends::new(
        config.default_backend,
        Arc::new(HeuristicBackend::new(config.heuristic_seed)),
    );

    if let Some(url) = &config.webhook_url {
        let client = WebhookClient::new(url.clone(), config.provider_timeout)
            .context("Failed to build webhook HTTP client")?;
        backends = backends.with_webhook(Arc::new(RemoteBackend::new(BackendKind::Webhook, client)));
        info!("Webhook analysis backend configured ({url})");
    }

    if let Some(key) = &config.anthropic_api_key {
        let llm = LlmClient::new(key.clone(), config.provider_timeout)
            .context("Failed to build LLM HTTP client")?;
        backends = backends.with_llm(Arc::new(RemoteBackend::new(
            BackendKind::Llm,
            LlmAnalysisProvider::new(llm),
        )));
        info!("LLM analysis backend configured (model: {})", llm_client::MODEL);
    }

    if backends.get(config.default_backend).is_none() {
        bail!(
            "ANALYSIS_BACKEND is '{}' but that backend is not configured",
            config.default_backend
        );
    }

    Ok(backends)
}
