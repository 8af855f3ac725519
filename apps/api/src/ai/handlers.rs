use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::ai::cost::{
    check_budget, estimate_tokens, format_cost, BudgetCheck, ModelRecommendation,
};
use crate::ai::features::{AiProfile, Complexity, Feature};
use crate::ai::prompts::{
    fill_template, FIX_FIELD_PROMPT_TEMPLATE, FIX_SECTION_PROMPT_TEMPLATE,
    FIX_SKILLS_PROMPT_TEMPLATE, FIX_SUMMARY_PROMPT_TEMPLATE,
};
use crate::ai::quota::{QuotaStatus, QuotaUsage};
use crate::ai::usage::UsageSnapshot;
use crate::ai::GenerationRequest;
use crate::errors::AppError;
use crate::state::AppState;

fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct UsageStatsResponse {
    pub usage: UsageSnapshot,
    /// `None` on unmetered tiers.
    pub budget: Option<BudgetCheck>,
    pub profile: AiProfile,
    pub models: Vec<String>,
}

/// GET /api/v1/usage/stats
pub async fn handle_usage_stats(State(state): State<AppState>) -> Json<UsageStatsResponse> {
    let usage = state.ai.usage().snapshot();
    let profile = state.ai.profile().clone();
    let budget = budget_status(&profile, &usage);
    Json(UsageStatsResponse {
        usage,
        budget,
        profile,
        models: state.ai.models().to_vec(),
    })
}

fn budget_status(profile: &AiProfile, usage: &UsageSnapshot) -> Option<BudgetCheck> {
    profile
        .is_metered()
        .then(|| check_budget(profile, usage.total_estimated_cost, 0.0))
}

#[derive(Serialize)]
pub struct UsageResetResponse {
    pub message: &'static str,
    pub usage: UsageSnapshot,
}

/// POST /api/v1/usage/reset
pub async fn handle_usage_reset(State(state): State<AppState>) -> Json<UsageResetResponse> {
    state.ai.usage().reset();
    Json(UsageResetResponse {
        message: "Usage counter reset",
        usage: state.ai.usage().snapshot(),
    })
}

#[derive(Serialize)]
pub struct QuotaResponse {
    pub status: QuotaStatus,
    pub usage: QuotaUsage,
}

/// GET /api/v1/usage/quota
pub async fn handle_quota(State(state): State<AppState>) -> Json<QuotaResponse> {
    let status = state.quota.status().await;
    let usage = state.quota.today_usage().await;
    Json(QuotaResponse { status, usage })
}

// ---------------------------------------------------------------------------
// Pricing & cost
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PricingEntry {
    pub model: String,
    pub display_name: String,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
}

/// GET /api/v1/ai/pricing
pub async fn handle_pricing(State(state): State<AppState>) -> Json<Vec<PricingEntry>> {
    let entries = state
        .ai
        .pricing()
        .entries()
        .iter()
        .map(|(model, pricing)| PricingEntry {
            model: model.clone(),
            display_name: pricing.display_name.clone(),
            input_cost_per_million: pricing.input_cost_per_million,
            output_cost_per_million: pricing.output_cost_per_million,
        })
        .collect();
    Json(entries)
}

#[derive(Deserialize)]
pub struct EstimateCostRequest {
    pub model: String,
    pub input_text: String,
    #[serde(default)]
    pub output_text: String,
}

#[derive(Serialize)]
pub struct EstimateCostResponse {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost: f64,
    pub formatted: String,
    pub known_model: bool,
}

/// POST /api/v1/ai/estimate-cost
pub async fn handle_estimate_cost(
    State(state): State<AppState>,
    Json(req): Json<EstimateCostRequest>,
) -> Result<Json<EstimateCostResponse>, AppError> {
    require_non_empty(&req.model, "model")?;
    let pricing = state.ai.pricing();
    let estimated_cost = pricing.estimate_cost(&req.model, &req.input_text, &req.output_text);
    Ok(Json(EstimateCostResponse {
        known_model: pricing.get(&req.model).is_some(),
        input_tokens: estimate_tokens(&req.input_text),
        output_tokens: estimate_tokens(&req.output_text),
        formatted: format_cost(estimated_cost),
        estimated_cost,
        model: req.model,
    }))
}

#[derive(Deserialize)]
pub struct RecommendModelRequest {
    pub input_text: String,
    /// Explicit complexity wins over the feature's configured complexity.
    pub complexity: Option<Complexity>,
    pub feature: Option<Feature>,
}

/// POST /api/v1/ai/recommend-model
pub async fn handle_recommend_model(
    State(state): State<AppState>,
    Json(req): Json<RecommendModelRequest>,
) -> Result<Json<ModelRecommendation>, AppError> {
    let complexity = match (req.complexity, req.feature) {
        (Some(c), _) => c,
        (None, Some(feature)) => state.ai.profile().complexity_for(feature),
        (None, None) => {
            return Err(AppError::Validation(
                "Provide either complexity or feature".to_string(),
            ))
        }
    };

    state
        .ai
        .pricing()
        .recommend_model(&req.input_text, complexity)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No priced models configured".to_string()))
}

// ---------------------------------------------------------------------------
// Grammar fixes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct FixedText {
    pub improved: String,
    pub model: String,
    pub estimated_cost: f64,
}

#[derive(Deserialize)]
pub struct FixFieldRequest {
    pub field: String,
    pub value: String,
}

/// POST /api/v1/ai/fix-field
pub async fn handle_fix_field(
    State(state): State<AppState>,
    Json(req): Json<FixFieldRequest>,
) -> Result<Json<FixedText>, AppError> {
    require_non_empty(&req.field, "field")?;
    require_non_empty(&req.value, "value")?;

    let prompt = fill_template(
        FIX_FIELD_PROMPT_TEMPLATE,
        &[("field", req.field.as_str()), ("value", req.value.as_str())],
    );
    let result = state
        .generate(GenerationRequest::text(prompt, Feature::FieldGrammar))
        .await?;

    Ok(Json(FixedText {
        improved: result.text,
        model: result.model,
        estimated_cost: result.estimated_cost,
    }))
}

#[derive(Deserialize)]
pub struct FixSummaryRequest {
    pub summary: String,
}

/// POST /api/v1/ai/fix-summary
pub async fn handle_fix_summary(
    State(state): State<AppState>,
    Json(req): Json<FixSummaryRequest>,
) -> Result<Json<FixedText>, AppError> {
    require_non_empty(&req.summary, "summary")?;

    let prompt = fill_template(FIX_SUMMARY_PROMPT_TEMPLATE, &[("summary", req.summary.as_str())]);
    let result = state
        .generate(GenerationRequest::text(prompt, Feature::SummaryGrammar))
        .await?;

    Ok(Json(FixedText {
        improved: result.text,
        model: result.model,
        estimated_cost: result.estimated_cost,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeSection {
    Experience,
    Education,
    Projects,
    Certifications,
}

impl ResumeSection {
    fn feature(self) -> Feature {
        match self {
            ResumeSection::Education => Feature::EducationGrammar,
            ResumeSection::Experience
            | ResumeSection::Projects
            | ResumeSection::Certifications => Feature::ExperienceGrammar,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ResumeSection::Experience => "experience",
            ResumeSection::Education => "education",
            ResumeSection::Projects => "projects",
            ResumeSection::Certifications => "certifications",
        }
    }
}

#[derive(Deserialize)]
pub struct FixSectionRequest {
    pub section: ResumeSection,
    /// Field name → text. Returned with the same keys.
    pub fields: serde_json::Map<String, Value>,
}

#[derive(Serialize)]
pub struct FixedSection {
    pub fields: serde_json::Map<String, Value>,
    pub model: String,
    pub estimated_cost: f64,
}

/// POST /api/v1/ai/fix-section
pub async fn handle_fix_section(
    State(state): State<AppState>,
    Json(req): Json<FixSectionRequest>,
) -> Result<Json<FixedSection>, AppError> {
    if req.fields.is_empty() {
        return Err(AppError::Validation("fields must not be empty".to_string()));
    }

    let fields = Value::Object(req.fields).to_string();
    let prompt = fill_template(
        FIX_SECTION_PROMPT_TEMPLATE,
        &[("section", req.section.label()), ("fields", fields.as_str())],
    );
    let (fields, result) = state
        .generate_json::<serde_json::Map<String, Value>>(prompt, req.section.feature())
        .await?;

    info!(section = req.section.label(), keys = fields.len(), "Section grammar fixed");
    Ok(Json(FixedSection {
        fields,
        model: result.model,
        estimated_cost: result.estimated_cost,
    }))
}

#[derive(Deserialize, Serialize)]
pub struct SkillList {
    pub skills: Vec<String>,
}

#[derive(Serialize)]
pub struct FixedSkills {
    pub skills: Vec<String>,
    pub model: String,
    pub estimated_cost: f64,
}

/// POST /api/v1/ai/fix-skills
pub async fn handle_fix_skills(
    State(state): State<AppState>,
    Json(req): Json<SkillList>,
) -> Result<Json<FixedSkills>, AppError> {
    if req.skills.iter().all(|s| s.trim().is_empty()) {
        return Err(AppError::Validation("skills must not be empty".to_string()));
    }

    let skills = req.skills.join(", ");
    let prompt = fill_template(FIX_SKILLS_PROMPT_TEMPLATE, &[("skills", skills.as_str())]);
    let (fixed, result) = state
        .generate_json::<SkillList>(prompt, Feature::SkillsGrammar)
        .await?;

    Ok(Json(FixedSkills {
        skills: fixed.skills,
        model: result.model,
        estimated_cost: result.estimated_cost,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::cost::BudgetWarning;
    use crate::ai::features::AiTier;
    use crate::ai::usage::UsageTracker;

    #[test]
    fn test_section_feature_mapping() {
        assert_eq!(ResumeSection::Education.feature(), Feature::EducationGrammar);
        assert_eq!(ResumeSection::Projects.feature(), Feature::ExperienceGrammar);
    }

    #[test]
    fn test_section_deserializes_lowercase() {
        let req: FixSectionRequest =
            serde_json::from_str(r#"{"section":"certifications","fields":{"name":"AWS sa"}}"#)
                .unwrap();
        assert_eq!(req.section, ResumeSection::Certifications);
        assert_eq!(req.fields["name"], "AWS sa");
    }

    #[test]
    fn test_budget_status_only_for_metered_tiers() {
        let usage = UsageTracker::default();
        usage.increment(0.001);
        let snapshot = usage.snapshot();

        assert!(budget_status(&AiProfile::for_tier(AiTier::Free), &snapshot).is_none());

        let budget = budget_status(&AiProfile::for_tier(AiTier::Basic), &snapshot).unwrap();
        assert!(budget.can_proceed);
        assert_eq!(budget.warning_level, BudgetWarning::None);
    }

    #[test]
    fn test_field_prompt_keeps_placeholder_text_from_caller() {
        let prompt = fill_template(
            FIX_FIELD_PROMPT_TEMPLATE,
            &[("field", "{value}"), ("value", "i has a degree")],
        );
        assert!(prompt.starts_with("Correct the grammar and syntax of the following {value}."));
        assert!(prompt.ends_with("Input: i has a degree"));
    }

    #[test]
    fn test_require_non_empty_rejects_whitespace() {
        assert!(require_non_empty("  \n", "value").is_err());
        assert!(require_non_empty("ok", "value").is_ok());
    }
}
