pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ai::handlers as ai;
use crate::matching::handlers as matching;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// Upper bound for multipart résumé uploads.
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Usage & quota
        .route("/api/v1/usage/stats", get(ai::handle_usage_stats))
        .route("/api/v1/usage/reset", post(ai::handle_usage_reset))
        .route("/api/v1/usage/quota", get(ai::handle_quota))
        // Cost
        .route("/api/v1/ai/pricing", get(ai::handle_pricing))
        .route("/api/v1/ai/estimate-cost", post(ai::handle_estimate_cost))
        .route("/api/v1/ai/recommend-model", post(ai::handle_recommend_model))
        // Grammar fixes
        .route("/api/v1/ai/fix-field", post(ai::handle_fix_field))
        .route("/api/v1/ai/fix-summary", post(ai::handle_fix_summary))
        .route("/api/v1/ai/fix-section", post(ai::handle_fix_section))
        .route("/api/v1/ai/fix-skills", post(ai::handle_fix_skills))
        // Matching
        .route("/api/v1/match/score", post(matching::handle_score))
        // Resumes
        .route(
            "/api/v1/resumes/upload",
            post(resumes::handle_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/resumes", get(resumes::handle_list))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get).delete(resumes::handle_delete),
        )
        .route("/api/v1/resumes/:id/analyze", post(resumes::handle_analyze))
        .with_state(state)
}
