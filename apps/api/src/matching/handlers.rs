use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::matching::{resolve_role_match, RoleMatchInput, RoleMatchOutcome};

#[derive(Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub role_description: String,
    pub resume_text: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Keywords extracted elsewhere; when non-empty the keyword ratio is returned.
    pub keywords: Option<Vec<String>>,
}

/// POST /api/v1/match/score
/// Local scoring only, no AI call.
pub async fn handle_score(Json(req): Json<ScoreRequest>) -> Result<Json<RoleMatchOutcome>, AppError> {
    let input = RoleMatchInput {
        role_title: &req.role_title,
        role_description: &req.role_description,
        resume_text: &req.resume_text,
        skills: &req.skills,
    };

    resolve_role_match(input, req.keywords.as_deref())
        .map(Json)
        .ok_or_else(|| {
            AppError::Validation("Provide a role title, description, or keywords".to_string())
        })
}
