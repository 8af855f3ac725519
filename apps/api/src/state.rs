use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::ai::error::AiError;
use crate::ai::features::Feature;
use crate::ai::orchestrator::ModelOrchestrator;
use crate::ai::quota::{QuotaTracker, RequestTracker};
use crate::ai::{GenerationRequest, GenerationResult};
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// Single entry point for every generation call.
    pub ai: Arc<ModelOrchestrator>,
    pub quota: QuotaTracker,
}

impl AppState {
    /// Orchestrated generation plus a best-effort tick on the shared daily quota.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, AiError> {
        let outcome = self.ai.generate(&request).await;
        track_if_served(&self.quota, request.feature, outcome).await
    }

    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        feature: Feature,
    ) -> Result<(T, GenerationResult), AiError> {
        let outcome = self.ai.generate_json(prompt, feature).await;
        track_if_served(&self.quota, feature, outcome).await
    }
}

/// Ticks `tracker` whenever a model actually answered, including answers that
/// failed to parse, so the shared quota agrees with the in-process usage count.
async fn track_if_served<T>(
    tracker: &impl RequestTracker,
    feature: Feature,
    outcome: Result<T, AiError>,
) -> Result<T, AiError> {
    if matches!(outcome, Ok(_) | Err(AiError::MalformedResponse { .. })) {
        tracker.track_request(feature.as_str()).await;
    }
    outcome
}
