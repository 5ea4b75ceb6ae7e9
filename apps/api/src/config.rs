use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::backend::BackendKind;

/// Application configuration loaded from environment variables.
/// Nothing is required: without provider settings only the heuristic backend is available.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub default_backend: BackendKind,
    pub webhook_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub provider_timeout: Duration,
    /// Fixed seed for reproducible heuristic runs.
    pub heuristic_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider_timeout_secs = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse::<u64>()
            .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_backend: std::env::var("ANALYSIS_BACKEND")
                .unwrap_or_else(|_| "heuristic".to_string())
                .parse::<BackendKind>()
                .map_err(anyhow::Error::msg)
                .context("ANALYSIS_BACKEND is invalid")?,
            webhook_url: optional_env("ANALYSIS_WEBHOOK_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            heuristic_seed: optional_env("HEURISTIC_SEED")
                .map(|s| s.parse::<u64>())
                .transpose()
                .context("HEURISTIC_SEED must be an unsigned integer")?,
        })
    }

    /// Local-only configuration: heuristic backend, no providers.
    #[cfg(test)]
    pub fn local(heuristic_seed: Option<u64>) -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            default_backend: BackendKind::Heuristic,
            webhook_url: None,
            anthropic_api_key: None,
            provider_timeout: Duration::from_secs(120),
            heuristic_seed,
        }
    }
}

/// Reads an optional variable. Set-but-blank counts as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
