/// LLM Client: the single point of entry for all LLM API calls in the service.
///
/// No other module may call the messages API directly; the LLM analysis provider goes
/// through here. Rate limits (429) and server errors are retried with exponential backoff;
/// exhausted credits (402) are never retried.
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AnalysisError;

pub mod prompts;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls. Hardcoded so every deployment scores with the same model.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} attempts: {message}")]
    RateLimited { retries: u32, message: String },

    #[error("Credits exhausted: {0}")]
    QuotaExhausted(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(e) => AnalysisError::ProviderUnavailable(e.to_string()),
            LlmError::RateLimited { message, .. } => AnalysisError::ProviderRateLimited(message),
            LlmError::QuotaExhausted(message) => AnalysisError::ProviderQuotaExhausted(message),
            LlmError::Api { status, message } if status >= 500 => {
                AnalysisError::ProviderUnavailable(format!("status {status}: {message}"))
            }
            LlmError::Api { status, message } => AnalysisError::ProviderReportedError {
                status: Some(status),
                message,
            },
            LlmError::Parse(e) => AnalysisError::ProviderMalformedResponse(e.to_string()),
            LlmError::EmptyContent => {
                AnalysisError::ProviderMalformedResponse("no content in LLM response".to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Wraps the messages API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Self::with_api_url(api_key, timeout, DEFAULT_API_URL)
    }

    pub fn with_api_url(
        api_key: String,
        timeout: Duration,
        api_url: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_url: api_url.into(),
        })
    }

    /// Makes a raw call, returning the full response object.
    /// Retries on 429 and 5xx with exponential backoff; 402 fails immediately.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::PAYMENT_REQUIRED {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::QuotaExhausted(api_error_message(body)));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API rate limited: {}", body);
                last_error = Some(LlmError::RateLimited {
                    retries: attempt + 1,
                    message: api_error_message(body),
                });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
            }

            let body = response.text().await?;
            let llm_response: LlmResponse = serde_json::from_str(&body).map_err(LlmError::Parse)?;

            if let Some(usage) = &llm_response.usage {
                debug!(
                    "LLM call succeeded: input_tokens={}, output_tokens={}",
                    usage.input_tokens, usage.output_tokens
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
            message: "retries exhausted".to_string(),
        }))
    }

    /// Calls the LLM and deserializes the JSON in its text response.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        serde_json::from_str(extract_json_block(text)).map_err(LlmError::Parse)
    }
}

/// Prefers `{"error": {"message"}}`, then `{"error": "..."}`, then the raw body.
fn api_error_message(body: String) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
        return parsed.error.message;
    }
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body)
}

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fenced block pattern"));

/// Returns the contents of the first ```json ... ``` (or bare ```) block anywhere in the
/// text, or the whole trimmed text when there is none.
fn extract_json_block(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/messages")
    }

    fn client(url: String) -> LlmClient {
        LlmClient::with_api_url("test-key".to_string(), Duration::from_secs(5), url).unwrap()
    }

    #[test]
    fn test_extract_json_block_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_block(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_json_block_without_tag() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(extract_json_block(input), "[1, 2]");
    }

    #[test]
    fn test_extract_json_block_surrounded_by_prose() {
        let input = "Here is the analysis:\n```json\n[{\"name\": \"A\"}]\n```\nLet me know!";
        assert_eq!(extract_json_block(input), "[{\"name\": \"A\"}]");
    }

    #[test]
    fn test_extract_json_block_no_fences() {
        assert_eq!(extract_json_block("  {\"key\": 1} "), "{\"key\": 1}");
    }

    #[test]
    fn test_api_error_message_shapes() {
        assert_eq!(
            api_error_message(r#"{"error": {"message": "bad key"}}"#.to_string()),
            "bad key"
        );
        assert_eq!(
            api_error_message(r#"{"error": "plain"}"#.to_string()),
            "plain"
        );
        assert_eq!(api_error_message("oops".to_string()), "oops");
    }

    #[test]
    fn test_llm_error_conversion() {
        assert!(matches!(
            AnalysisError::from(LlmError::QuotaExhausted("x".into())),
            AnalysisError::ProviderQuotaExhausted(_)
        ));
        assert!(matches!(
            AnalysisError::from(LlmError::RateLimited {
                retries: 3,
                message: "x".into()
            }),
            AnalysisError::ProviderRateLimited(_)
        ));
        assert!(matches!(
            AnalysisError::from(LlmError::Api {
                status: 503,
                message: "down".into()
            }),
            AnalysisError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            AnalysisError::from(LlmError::Api {
                status: 400,
                message: "bad".into()
            }),
            AnalysisError::ProviderReportedError {
                status: Some(400),
                ..
            }
        ));
        assert!(matches!(
            AnalysisError::from(LlmError::EmptyContent),
            AnalysisError::ProviderMalformedResponse(_)
        ));
    }

    #[tokio::test]
    async fn test_call_json_parses_fenced_reply() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async {
                Json(json!({
                    "content": [{"type": "text", "text": "```json\n[{\"name\": \"Ann\"}]\n```"}],
                    "usage": {"input_tokens": 10, "output_tokens": 5}
                }))
            }),
        );
        let llm = client(serve(router).await);
        let value: Value = llm.call_json("prompt", "system").await.unwrap();
        assert_eq!(value[0]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_payment_required_is_not_retried() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async {
                (
                    AxumStatus::PAYMENT_REQUIRED,
                    Json(json!({"error": {"message": "credits exhausted"}})),
                )
            }),
        );
        let llm = client(serve(router).await);
        let err = llm.call("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::QuotaExhausted(ref m) if m == "credits exhausted"));
    }

    #[tokio::test]
    async fn test_client_error_returns_api_error() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async { (AxumStatus::BAD_REQUEST, "bad request") }),
        );
        let llm = client(serve(router).await);
        let err = llm.call("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async { Json(json!({"content": []})) }),
        );
        let llm = client(serve(router).await);
        let err = llm.call_json::<Value>("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_malformed() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async { "<html>not json</html>" }),
        );
        let llm = client(serve(router).await);
        let err = llm.call_json::<Value>("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
        assert!(matches!(
            AnalysisError::from(err),
            AnalysisError::ProviderMalformedResponse(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried_then_surfaced() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let router = Router::new().route(
            "/v1/messages",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        AxumStatus::TOO_MANY_REQUESTS,
                        Json(json!({"error": {"message": "slow down"}})),
                    )
                }
            }),
        );
        let llm = LlmClient::with_api_url(
            "test-key".to_string(),
            Duration::from_secs(3600),
            serve(router).await,
        )
        .unwrap();

        let started = tokio::time::Instant::now();
        let err = llm.call("prompt", "system").await.unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(matches!(err, LlmError::RateLimited { retries: 3, .. }));
        assert!(matches!(
            AnalysisError::from(err),
            AnalysisError::ProviderRateLimited(ref m) if m == "slow down"
        ));
    }
}
