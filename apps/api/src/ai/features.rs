//! Feature tags, complexity tiers, and the per-deployment AI profile.
//!
//! The profile is built once at startup from `AI_TIER` (plus budget overrides)
//! and injected into the orchestrator and app state.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::retry::RetryPolicy;

/// What a generation request is for. Drives logging, error messages, and model recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    ResumeAnalysis,
    KeywordExtraction,
    CoverLetter,
    ResumeBuilding,
    JobMatching,
    FieldGrammar,
    SummaryGrammar,
    ExperienceGrammar,
    EducationGrammar,
    SkillsGrammar,
}

impl Feature {
    #[cfg(test)]
    pub const ALL: [Feature; 10] = [
        Feature::ResumeAnalysis,
        Feature::KeywordExtraction,
        Feature::CoverLetter,
        Feature::ResumeBuilding,
        Feature::JobMatching,
        Feature::FieldGrammar,
        Feature::SummaryGrammar,
        Feature::ExperienceGrammar,
        Feature::EducationGrammar,
        Feature::SkillsGrammar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ResumeAnalysis => "resume-analysis",
            Feature::KeywordExtraction => "keyword-extraction",
            Feature::CoverLetter => "cover-letter",
            Feature::ResumeBuilding => "resume-building",
            Feature::JobMatching => "job-matching",
            Feature::FieldGrammar => "field-grammar",
            Feature::SummaryGrammar => "summary-grammar",
            Feature::ExperienceGrammar => "experience-grammar",
            Feature::EducationGrammar => "education-grammar",
            Feature::SkillsGrammar => "skills-grammar",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiTier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl FromStr for AiTier {
    type Err = std::convert::Infallible;

    /// Unknown tiers fall back to free.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "basic" | "paid" => AiTier::Basic,
            "premium" => AiTier::Premium,
            _ => AiTier::Free,
        })
    }
}

/// Budget, retry, and feature-complexity settings for one deployment tier.
#[derive(Debug, Clone, Serialize)]
pub struct AiProfile {
    pub tier: AiTier,
    /// USD per day. Zero on the free tier.
    pub daily_budget: f64,
    pub monthly_budget: f64,
    /// Percent of budget at which usage is flagged.
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    #[serde(skip)]
    pub retry: RetryPolicy,
    pub feature_complexity: HashMap<Feature, Complexity>,
}

impl AiProfile {
    pub fn for_tier(tier: AiTier) -> Self {
        use Complexity::*;
        use Feature::*;

        let (daily_budget, monthly_budget, warning, critical, retry) = match tier {
            AiTier::Free => (0.0, 0.0, 80.0, 95.0, RetryPolicy::default()),
            AiTier::Basic => (
                0.50,
                15.00,
                75.0,
                90.0,
                RetryPolicy {
                    max_retries: 5,
                    base_delay: Duration::from_millis(500),
                    max_delay: Duration::from_millis(4000),
                    ..RetryPolicy::default()
                },
            ),
            AiTier::Premium => (
                2.00,
                60.00,
                70.0,
                85.0,
                RetryPolicy {
                    max_retries: 5,
                    base_delay: Duration::from_millis(300),
                    max_delay: Duration::from_millis(2000),
                    ..RetryPolicy::default()
                },
            ),
        };

        let feature_complexity: HashMap<Feature, Complexity> = match tier {
            AiTier::Free => [
                (ResumeAnalysis, Medium),
                (KeywordExtraction, Simple),
                (JobMatching, Medium),
                (CoverLetter, Simple),
                (ResumeBuilding, Medium),
                (FieldGrammar, Simple),
                (SummaryGrammar, Simple),
                (ExperienceGrammar, Simple),
                (EducationGrammar, Simple),
                (SkillsGrammar, Simple),
            ]
            .into(),
            AiTier::Basic => [
                (ResumeAnalysis, Complex),
                (KeywordExtraction, Medium),
                (JobMatching, Medium),
                (CoverLetter, Medium),
                (ResumeBuilding, Complex),
                (FieldGrammar, Simple),
                (SummaryGrammar, Medium),
                (ExperienceGrammar, Medium),
                (EducationGrammar, Simple),
                (SkillsGrammar, Simple),
            ]
            .into(),
            AiTier::Premium => [
                (ResumeAnalysis, Complex),
                (KeywordExtraction, Complex),
                (JobMatching, Complex),
                (CoverLetter, Complex),
                (ResumeBuilding, Complex),
                (FieldGrammar, Medium),
                (SummaryGrammar, Complex),
                (ExperienceGrammar, Medium),
                (EducationGrammar, Medium),
                (SkillsGrammar, Medium),
            ]
            .into(),
        };

        Self {
            tier,
            daily_budget,
            monthly_budget,
            warning_threshold: warning,
            critical_threshold: critical,
            retry,
            feature_complexity,
        }
    }

    /// Whether calls are billed against a daily budget. The free tier is not.
    pub fn is_metered(&self) -> bool {
        self.daily_budget > 0.0
    }

    pub fn complexity_for(&self, feature: Feature) -> Complexity {
        self.feature_complexity
            .get(&feature)
            .copied()
            .unwrap_or(Complexity::Medium)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        assert_eq!("premium".parse::<AiTier>().unwrap(), AiTier::Premium);
        assert_eq!("Paid".parse::<AiTier>().unwrap(), AiTier::Basic);
        assert_eq!("BASIC".parse::<AiTier>().unwrap(), AiTier::Basic);
        assert_eq!("whatever".parse::<AiTier>().unwrap(), AiTier::Free);
    }

    #[test]
    fn test_every_feature_has_a_complexity_in_every_tier() {
        for tier in [AiTier::Free, AiTier::Basic, AiTier::Premium] {
            let profile = AiProfile::for_tier(tier);
            for feature in Feature::ALL {
                assert!(
                    profile.feature_complexity.contains_key(&feature),
                    "{tier:?} missing {feature}"
                );
            }
        }
    }

    #[test]
    fn test_free_tier_uses_default_retry_policy() {
        let profile = AiProfile::for_tier(AiTier::Free);
        assert_eq!(profile.retry.max_retries, 3);
        assert_eq!(profile.retry.base_delay, Duration::from_millis(1000));
        assert_eq!(profile.retry.max_delay, Duration::from_millis(10_000));
        assert_eq!(profile.daily_budget, 0.0);
        assert!(!profile.is_metered());
        assert!(AiProfile::for_tier(AiTier::Basic).is_metered());
    }

    #[test]
    fn test_premium_analysis_is_complex() {
        let profile = AiProfile::for_tier(AiTier::Premium);
        assert_eq!(profile.complexity_for(Feature::ResumeAnalysis), Complexity::Complex);
    }

    #[test]
    fn test_feature_tags_serialize_kebab_case() {
        let json = serde_json::to_string(&Feature::ResumeAnalysis).unwrap();
        assert_eq!(json, r#""resume-analysis""#);
        assert_eq!(Feature::SkillsGrammar.to_string(), "skills-grammar");
    }
}
