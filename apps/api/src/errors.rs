use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::ai::error::AiError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<Value>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
                None,
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Ai(e) => ai_parts(e),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

fn ai_parts(e: &AiError) -> (StatusCode, &'static str, String, Option<Value>) {
    match e {
        AiError::RateLimited { model, .. } => {
            tracing::warn!(model = %model, "Returning rate limit to client");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "AI_RATE_LIMITED",
                "The AI service is busy. Please try again in a moment.".to_string(),
                None,
            )
        }
        AiError::QuotaExhausted { model, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "AI_QUOTA_EXCEEDED",
            format!("Daily AI quota exceeded for {model}. Please try again tomorrow."),
            None,
        ),
        AiError::AllModelsExhausted { attempted, guidance } => (
            StatusCode::TOO_MANY_REQUESTS,
            "AI_QUOTA_EXCEEDED",
            guidance.clone(),
            Some(json!({ "attemptedModels": attempted })),
        ),
        AiError::MalformedResponse { feature, raw } => {
            tracing::error!(feature = %feature, "Malformed AI response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_MALFORMED_RESPONSE",
                format!("Failed to parse AI response for {feature}"),
                Some(json!({ "raw": raw })),
            )
        }
        AiError::Upstream { status, message } => {
            tracing::error!(?status, "Upstream AI error: {message}");
            (
                StatusCode::BAD_GATEWAY,
                "AI_UPSTREAM_ERROR",
                "An AI processing error occurred".to_string(),
                None,
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_errors_map_to_429() {
        let err = AppError::from(AiError::QuotaExhausted {
            model: "gemini-1.5-flash".into(),
            message: "quota exceeded".into(),
        });
        let (status, code, _, _) = err.parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(code, "AI_QUOTA_EXCEEDED");
    }

    #[test]
    fn test_all_models_exhausted_carries_guidance_and_models() {
        let err = AppError::from(AiError::AllModelsExhausted {
            attempted: vec!["a".into(), "b".into()],
            guidance: "try tomorrow".into(),
        });
        let (status, _, message, details) = err.parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(message, "try tomorrow");
        assert_eq!(details.unwrap()["attemptedModels"][1], "b");
    }

    #[test]
    fn test_malformed_response_exposes_raw_text() {
        let err = AppError::from(AiError::MalformedResponse {
            feature: "resume-analysis".into(),
            raw: "not json".into(),
        });
        let (status, _, _, details) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(details.unwrap()["raw"], "not json");
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = AppError::from(AiError::upstream("boom"));
        assert_eq!(err.parts().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        let err = AppError::from(AiError::RateLimited {
            model: "m".into(),
            status: 429,
            message: "slow down".into(),
        });
        assert_eq!(err.parts().0, StatusCode::TOO_MANY_REQUESTS);
    }
}
