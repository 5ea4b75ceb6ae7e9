use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure kinds of one analysis run. Every provider-path variant aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analysis provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Analysis provider rate limited: {0}")]
    ProviderRateLimited(String),

    #[error("Analysis provider quota exhausted: {0}")]
    ProviderQuotaExhausted(String),

    #[error("Malformed provider response: {0}")]
    ProviderMalformedResponse(String),

    #[error("Provider reported an error{}: {message}", status_suffix(.status))]
    ProviderReportedError {
        status: Option<u16>,
        message: String,
    },
}

impl AnalysisError {
    /// Stable machine-readable code, shared by logs and HTTP responses.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "VALIDATION_ERROR",
            AnalysisError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            AnalysisError::ProviderRateLimited(_) => "RATE_LIMITED",
            AnalysisError::ProviderQuotaExhausted(_) => "QUOTA_EXHAUSTED",
            AnalysisError::ProviderMalformedResponse(_) => "PROVIDER_MALFORMED_RESPONSE",
            AnalysisError::ProviderReportedError { .. } => "PROVIDER_ERROR",
        }
    }

    pub fn is_provider_failure(&self) -> bool {
        !matches!(self, AnalysisError::InvalidInput(_))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Backend not configured: {0}")]
    BackendUnavailable(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BackendUnavailable(msg) => (
                StatusCode::BAD_REQUEST,
                "BACKEND_NOT_CONFIGURED",
                msg.clone(),
            ),
            AppError::Analysis(e) => {
                let status = match e {
                    AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    AnalysisError::ProviderRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                    AnalysisError::ProviderQuotaExhausted(_) => StatusCode::PAYMENT_REQUIRED,
                    AnalysisError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    AnalysisError::ProviderMalformedResponse(_)
                    | AnalysisError::ProviderReportedError { .. } => StatusCode::BAD_GATEWAY,
                };
                if status.is_server_error() {
                    tracing::error!("Analysis error: {e}");
                }
                (status, e.code(), e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
