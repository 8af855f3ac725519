//! Résumé ↔ role matching.
//!
//! Two scorers coexist and are not reconciled:
//! - `role_score::score_role_match`: weighted-token heuristic, needs only text.
//! - `keywords::KeywordMatcher`: ratio of model-extracted keywords found in the résumé.
//!
//! `resolve_role_match` applies the precedence: the keyword ratio wins whenever
//! extraction produced at least one usable keyword; otherwise the heuristic is
//! used if any role text was given; otherwise there is no score.

pub mod handlers;
pub mod keywords;
pub mod role_score;

use serde::{Deserialize, Serialize};

use crate::matching::keywords::{normalize_keywords, KeywordMatcher};
use crate::matching::role_score::score_role_match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Heuristic,
    KeywordRatio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMatchOutcome {
    pub score: u32,
    pub source: ScoreSource,
    pub matching_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// Borrowed inputs for one résumé/role comparison.
#[derive(Debug, Clone, Copy)]
pub struct RoleMatchInput<'a> {
    pub role_title: &'a str,
    pub role_description: &'a str,
    pub resume_text: &'a str,
    pub skills: &'a [String],
}

impl RoleMatchInput<'_> {
    pub fn has_role_text(&self) -> bool {
        !self.role_title.trim().is_empty() || !self.role_description.trim().is_empty()
    }
}

/// `extracted_keywords` is `None` when extraction was not attempted or failed.
pub fn resolve_role_match(
    input: RoleMatchInput<'_>,
    extracted_keywords: Option<&[String]>,
) -> Option<RoleMatchOutcome> {
    let keywords = extracted_keywords.map(normalize_keywords).unwrap_or_default();

    if !keywords.is_empty() {
        let matched = KeywordMatcher::new(input.resume_text, input.skills).evaluate(&keywords);
        // non-empty keyword list always yields a ratio
        let score = matched.ratio_score().unwrap_or(0);
        return Some(RoleMatchOutcome {
            score,
            source: ScoreSource::KeywordRatio,
            matching_keywords: matched.matching_keywords,
            missing_keywords: matched.missing_keywords,
        });
    }

    if !input.has_role_text() {
        return None;
    }

    Some(RoleMatchOutcome {
        score: score_role_match(input.role_title, input.role_description, input.resume_text),
        source: ScoreSource::Heuristic,
        matching_keywords: Vec::new(),
        missing_keywords: Vec::new(),
    })
}
