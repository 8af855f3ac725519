//! AI request orchestration: the single point of entry for all generation calls.
//!
//! ARCHITECTURAL RULE: handlers never call the vendor API directly. Every
//! generation goes through `ModelOrchestrator::generate`, which applies
//! per-model retry/backoff, quota fallback, cost estimation, and usage tracking.

use async_trait::async_trait;
use serde::Serialize;

pub mod cost;
pub mod error;
pub mod features;
pub mod gemini;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod quota;
pub mod retry;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

use crate::ai::error::AiError;
use crate::ai::features::Feature;

/// Boundary to a generative-text API: one model, one prompt, one text response.
///
/// Implementations must classify failures into `AiError` variants before returning.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, AiError>;
}

/// Per-call input; discarded after the response.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub feature: Feature,
    pub json_mode: bool,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>, feature: Feature) -> Self {
        Self {
            prompt: prompt.into(),
            feature,
            json_mode: false,
        }
    }

    pub fn json(prompt: impl Into<String>, feature: Feature) -> Self {
        Self {
            prompt: prompt.into(),
            feature,
            json_mode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub text: String,
    /// USD, never negative.
    pub estimated_cost: f64,
    pub model: String,
}
