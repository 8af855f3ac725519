//! Multi-model fallback orchestrator.
//!
//! Tries each candidate model in priority order (fast → balanced → premium),
//! delegating every attempt to the retry executor. Only quota exhaustion moves
//! on to the next model; any other failure is treated as systemic and returned.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::ai::cost::{format_cost, PricingTable};
use crate::ai::error::AiError;
use crate::ai::features::{AiProfile, Feature};
use crate::ai::retry::{generate_with_retry, RetryPolicy};
use crate::ai::usage::UsageTracker;
use crate::ai::{GenerationRequest, GenerationResult, GenerativeBackend};

/// Default fallback order.
pub const DEFAULT_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.0-pro"];

const ALL_MODELS_EXHAUSTED_GUIDANCE: &str = "All AI models have reached their daily quota limits. \
    Please try again tomorrow or consider upgrading to a paid plan for higher limits.";

pub struct ModelOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    models: Vec<String>,
    retry: RetryPolicy,
    pricing: Arc<PricingTable>,
    usage: Arc<UsageTracker>,
    profile: AiProfile,
}

impl ModelOrchestrator {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        models: Vec<String>,
        pricing: Arc<PricingTable>,
        usage: Arc<UsageTracker>,
        profile: AiProfile,
    ) -> Self {
        Self {
            backend,
            models,
            retry: profile.retry.clone(),
            pricing,
            usage,
            profile,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn profile(&self) -> &AiProfile {
        &self.profile
    }

    /// `generate(prompt, feature, {json_mode})`.
    ///
    /// The usage counter is bumped once per successful generation, before
    /// post-processing, so a JSON-mode parse failure still counts as a request.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, AiError> {
        let feature = request.feature;
        info!(
            feature = %feature,
            complexity = ?self.profile.complexity_for(feature),
            json_mode = request.json_mode,
            "Orchestrating generation"
        );

        let mut result = self.try_models(&request.prompt, feature).await?;

        let count = self.usage.increment(result.estimated_cost);
        info!(
            feature = %feature,
            model = %result.model,
            cost = %format_cost(result.estimated_cost),
            request_count = count,
            "Generation complete"
        );

        result.text = if request.json_mode {
            extract_json_object(&result.text)
                .map_err(|_| {
                    error!(feature = %feature, "JSON parsing failed for AI response");
                    AiError::MalformedResponse {
                        feature: feature.to_string(),
                        raw: result.text.clone(),
                    }
                })?
                .to_string()
        } else {
            strip_markdown_fences(&result.text).to_string()
        };

        Ok(result)
    }

    /// JSON-mode generation deserialized straight into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        feature: Feature,
    ) -> Result<(T, GenerationResult), AiError> {
        let result = self.generate(&GenerationRequest::json(prompt, feature)).await?;
        let parsed = serde_json::from_str::<T>(&result.text).map_err(|e| {
            warn!(feature = %feature, error = %e, "AI JSON did not match the expected structure");
            AiError::MalformedResponse {
                feature: feature.to_string(),
                raw: result.text.clone(),
            }
        })?;
        Ok((parsed, result))
    }

    async fn try_models(&self, prompt: &str, feature: Feature) -> Result<GenerationResult, AiError> {
        let mut exhausted = Vec::new();

        for model in &self.models {
            info!(model = %model, feature = %feature, "Trying model");
            match generate_with_retry(self.backend.as_ref(), model, prompt, &self.retry, &self.pricing).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_quota_exhausted() => {
                    warn!(model = %model, "Quota exhausted, falling back to next model");
                    exhausted.push(model.clone());
                }
                Err(e) => {
                    error!(model = %model, error = %e, "Model failed with non-quota error");
                    return Err(e);
                }
            }
        }

        error!(attempted = ?exhausted, feature = %feature, "All models exhausted their quotas");
        Err(AiError::AllModelsExhausted {
            attempted: exhausted,
            guidance: ALL_MODELS_EXHAUSTED_GUIDANCE.to_string(),
        })
    }
}

/// Strips a leading ```lang fence and a trailing ``` fence, then trims.
pub fn strip_markdown_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let lang_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        text = rest[lang_len..].trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Extracts the outermost `{...}` span (first `{` to last `}`) and checks it parses as JSON.
pub fn extract_json_object(text: &str) -> Result<&str, serde_json::Error> {
    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    };
    serde_json::from_str::<serde_json::Value>(candidate)?;
    Ok(candidate)
}
