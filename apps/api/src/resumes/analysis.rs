//! AI résumé analysis plus role matching, persisted as one JSONB document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::features::Feature;
use crate::ai::prompts::{keyword_extraction_prompt, resume_analysis_prompt};
use crate::errors::AppError;
use crate::matching::{resolve_role_match, RoleMatchInput, RoleMatchOutcome, ScoreSource};
use crate::models::resume::ResumeRow;
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryScores {
    pub formatting: u32,
    pub content: u32,
    pub keywords: u32,
    pub impact: u32,
}

/// Model feedback plus the locally computed role match. Fields the model omits default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeAnalysis {
    pub overall_score: u32,
    pub category_scores: CategoryScores,
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_match_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_match_source: Option<ScoreSource>,
    pub matching_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

impl ResumeAnalysis {
    pub fn apply_role_match(&mut self, outcome: RoleMatchOutcome) {
        self.role_match_score = Some(outcome.score);
        self.role_match_source = Some(outcome.source);
        self.matching_keywords = outcome.matching_keywords;
        self.missing_keywords = outcome.missing_keywords;
    }
}

#[derive(Debug, Deserialize)]
struct KeywordList {
    #[serde(default)]
    keywords: Vec<String>,
}

/// Runs the analysis prompt, then scores the résumé against the role when one is given.
///
/// Keyword extraction failures are logged and the heuristic score is used instead;
/// a failure of the analysis call itself is returned.
pub async fn analyze_resume(
    state: &AppState,
    resume: &ResumeRow,
    role_title: &str,
    role_description: &str,
) -> Result<ResumeAnalysis, AppError> {
    let (mut analysis, result) = state
        .generate_json::<ResumeAnalysis>(
            resume_analysis_prompt(&resume.parsed_text),
            Feature::ResumeAnalysis,
        )
        .await?;
    analysis.model = Some(result.model);
    analysis.estimated_cost = Some(result.estimated_cost);

    let input = RoleMatchInput {
        role_title,
        role_description,
        resume_text: &resume.parsed_text,
        skills: &resume.skills,
    };

    let extracted = if input.has_role_text() {
        analysis.role_title = Some(role_title.trim().to_string()).filter(|t| !t.is_empty());
        extract_keywords(state, role_title, role_description).await
    } else {
        None
    };

    if let Some(outcome) = resolve_role_match(input, extracted.as_deref()) {
        info!(
            resume_id = %resume.id,
            score = outcome.score,
            source = ?outcome.source,
            matched = outcome.matching_keywords.len(),
            "Computed role match"
        );
        analysis.apply_role_match(outcome);
    }

    Ok(analysis)
}

async fn extract_keywords(
    state: &AppState,
    role_title: &str,
    role_description: &str,
) -> Option<Vec<String>> {
    match state
        .generate_json::<KeywordList>(
            keyword_extraction_prompt(role_title, role_description),
            Feature::KeywordExtraction,
        )
        .await
    {
        Ok((list, _)) => Some(list.keywords),
        Err(e) => {
            warn!(error = %e, "Keyword extraction failed, falling back to heuristic score");
            None
        }
    }
}

/// Stores the analysis document and returns the analysis timestamp.
pub async fn persist_analysis(
    pool: &PgPool,
    resume_id: Uuid,
    analysis: &ResumeAnalysis,
) -> Result<DateTime<Utc>, AppError> {
    let document = serde_json::to_value(analysis).map_err(anyhow::Error::from)?;
    let analyzed_at: DateTime<Utc> = sqlx::query_scalar(
        "UPDATE resumes SET analysis = $1, analyzed_at = now() WHERE id = $2 RETURNING analyzed_at",
    )
    .bind(document)
    .bind(resume_id)
    .fetch_one(pool)
    .await?;

    info!(%resume_id, "Persisted resume analysis");
    Ok(analyzed_at)
}
