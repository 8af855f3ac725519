//! Failure taxonomy for generation calls.
//!
//! Vendor errors are classified exactly once, at the adapter boundary, into one of
//! these variants. Retry and fallback logic switches on the variant and never
//! re-inspects status codes or message text.

use serde::Deserialize;
use thiserror::Error;

/// Detail type Gemini attaches when a per-period quota has been consumed.
const QUOTA_FAILURE_TYPE: &str = "type.googleapis.com/google.rpc.QuotaFailure";

/// Message fragments that identify quota exhaustion when no structured detail is present.
const QUOTA_MESSAGE_PATTERNS: &[&str] = &["exceeded your current quota", "quota exceeded", "FreeTier"];

#[derive(Debug, Error)]
pub enum AiError {
    /// Transient 429-class throttling. Retried by the executor up to its policy limit.
    #[error("rate limited by {model} (status {status}): {message}")]
    RateLimited {
        model: String,
        status: u16,
        message: String,
    },

    /// The model's daily/monthly allowance is spent. Never retried on the same model.
    #[error("daily quota exceeded for {model}: {message}")]
    QuotaExhausted { model: String, message: String },

    /// Every candidate model reported quota exhaustion.
    #[error("{guidance}")]
    AllModelsExhausted {
        attempted: Vec<String>,
        guidance: String,
    },

    /// JSON-mode output that could not be parsed. `raw` keeps the model text for diagnostics.
    #[error("invalid JSON response from AI for {feature}")]
    MalformedResponse { feature: String, raw: String },

    /// Anything else coming back from the generation API.
    #[error("upstream AI error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

impl AiError {
    pub fn upstream(message: impl Into<String>) -> Self {
        AiError::Upstream {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AiError::RateLimited { .. })
    }

    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, AiError::QuotaExhausted { .. })
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Upstream {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

/// Classifies a non-success response from the generation API.
///
/// Quota exhaustion is checked first: Gemini reports it with HTTP 429 as well,
/// and it must not be mistaken for a retryable throttle.
pub fn classify_api_failure(model: &str, status: u16, body: &str) -> AiError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let message = if envelope.error.message.is_empty() {
        body.trim().to_string()
    } else {
        envelope.error.message.clone()
    };

    let has_quota_detail = envelope
        .error
        .details
        .iter()
        .any(|d| d.get("@type").and_then(|t| t.as_str()) == Some(QUOTA_FAILURE_TYPE));
    let has_quota_message = QUOTA_MESSAGE_PATTERNS.iter().any(|p| message.contains(p));

    if has_quota_detail || has_quota_message {
        return AiError::QuotaExhausted {
            model: model.to_string(),
            message,
        };
    }

    let throttled = status == 429
        || envelope.error.status == "Too Many Requests"
        || message.contains("429")
        || message.contains("Too Many Requests");

    if throttled {
        return AiError::RateLimited {
            model: model.to_string(),
            status,
            message,
        };
    }

    AiError::Upstream {
        status: Some(status),
        message,
    }
}
