//! Heuristic role-match scorer.
//!
//! Scores how well résumé text covers a target role on a 0–100 scale. Pure and
//! deterministic: no LLM call, no hidden state.
//!
//! Algorithm:
//! 1. Normalize title, description, and résumé (lowercase, letters/digits/spaces only).
//! 2. Collect unique title and description tokens (no stopwords, length > 2).
//! 3. Weight stemmed tokens: description 1.0, title 1.5, max per stem.
//! 4. For each weighted token take the first matching rule:
//!    exact token 1.0 → stem 0.9 → substring either way 0.7 →
//!    phrase in résumé text 0.6 → ≥60% character overlap 0.6 → 0.
//! 5. score = round(100 × Σ(match × weight) / Σ(weight)), clamped to [0, 100].

use std::collections::{BTreeMap, HashSet};

const DESCRIPTION_WEIGHT: f64 = 1.0;
const TITLE_WEIGHT: f64 = 1.5;

const EXACT_MATCH: f64 = 1.0;
const STEM_MATCH: f64 = 0.9;
const SUBSTRING_MATCH: f64 = 0.7;
const PHRASE_MATCH: f64 = 0.6;
const FUZZY_MATCH: f64 = 0.6;

const FUZZY_MIN_TOKEN_LEN: usize = 4;
const FUZZY_MIN_OVERLAP: f64 = 0.6;

/// Suffixes stripped by `stem`, longest-alternative first where they overlap.
const STEM_SUFFIXES: &[&str] = &["ing", "ed", "ly", "es", "s"];

const STOPWORDS: &[&str] = &[
    "the", "and", "a", "an", "to", "for", "of", "in", "on", "with", "is", "are", "or", "by", "as",
    "at", "from", "that", "this", "it", "you", "your", "we", "our", "be", "been", "was", "were",
    "will", "can", "may", "should", "has", "have", "had", "i", "me", "my", "so", "such",
];

/// `score(role_title, role_description, resume_text) -> 0..=100`.
///
/// Returns 0 when neither title nor description yields a usable token.
pub fn score_role_match(role_title: &str, role_description: &str, resume_text: &str) -> u32 {
    let title = normalize(role_title);
    let description = normalize(role_description);
    let resume = normalize(resume_text);

    // BTreeMap so the weighted vocabulary iterates in a stable order.
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    for token in vocabulary_tokens(&description) {
        let entry = weights.entry(stem(token).to_string()).or_insert(0.0);
        *entry = entry.max(DESCRIPTION_WEIGHT);
    }
    for token in vocabulary_tokens(&title) {
        let entry = weights.entry(stem(token).to_string()).or_insert(0.0);
        *entry = entry.max(TITLE_WEIGHT);
    }

    if weights.is_empty() {
        return 0;
    }

    let resume_tokens = unique_tokens(&resume, |t| t.chars().count() > 2);
    let resume_token_set: HashSet<&str> = resume_tokens.iter().copied().collect();
    let resume_stems: HashSet<&str> = resume_tokens.iter().map(|t| stem(*t)).collect();

    let mut weighted_match = 0.0;
    let mut total_weight = 0.0;

    for (token, weight) in &weights {
        total_weight += weight;
        let value = match_value(token, &resume_tokens, &resume_token_set, &resume_stems, &resume);
        weighted_match += value * weight;
    }

    let raw = weighted_match / total_weight * 100.0;
    raw.clamp(0.0, 100.0).round() as u32
}

fn match_value(
    token: &str,
    resume_tokens: &[&str],
    resume_token_set: &HashSet<&str>,
    resume_stems: &HashSet<&str>,
    resume_text: &str,
) -> f64 {
    if resume_token_set.contains(token) {
        return EXACT_MATCH;
    }
    if resume_stems.contains(token) {
        return STEM_MATCH;
    }
    if resume_tokens
        .iter()
        .any(|rt| rt.contains(token) || token.contains(rt))
    {
        return SUBSTRING_MATCH;
    }
    if resume_text.contains(token) {
        return PHRASE_MATCH;
    }
    if resume_tokens
        .iter()
        .any(|rt| character_overlap(token, rt).is_some_and(|o| o >= FUZZY_MIN_OVERLAP))
    {
        return FUZZY_MATCH;
    }
    0.0
}

/// Share of `a`'s characters (with repeats) that occur anywhere in `b`, over the longer length.
/// `None` when either token is shorter than four characters.
fn character_overlap(a: &str, b: &str) -> Option<f64> {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len.min(b_len) < FUZZY_MIN_TOKEN_LEN {
        return None;
    }
    let b_chars: HashSet<char> = b.chars().collect();
    let common = a.chars().filter(|c| b_chars.contains(c)).count();
    Some(common as f64 / a_len.max(b_len) as f64)
}

/// Lowercase, replace anything that is not a letter, digit, or space with a space,
/// collapse whitespace.
pub(crate) fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Crude suffix stripping: removes the first matching suffix of `ing|ed|ly|es|s`.
pub(crate) fn stem(token: &str) -> &str {
    STEM_SUFFIXES
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token)
}

fn vocabulary_tokens(normalized: &str) -> Vec<&str> {
    unique_tokens(normalized, |t| t.chars().count() > 2 && !STOPWORDS.contains(&t))
}

/// Unique tokens in first-seen order.
fn unique_tokens(normalized: &str, keep: impl Fn(&str) -> bool) -> Vec<&str> {
    let mut seen = HashSet::new();
    normalized
        .split(' ')
        .filter(|t| !t.is_empty() && keep(*t))
        .filter(|t| seen.insert(*t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_engineer_scenario_scores_high() {
        let score = score_role_match(
            "Software Engineer",
            "Python and SQL required",
            "Experienced software engineer skilled in python, SQL, and leadership",
        );
        // software, engineer (1.5 each), python, sql (1.0 each) match exactly; "requir" does not.
        assert_eq!(score, 83);
    }

    #[test]
    fn test_empty_role_scores_zero() {
        assert_eq!(score_role_match("", "", "any resume text"), 0);
    }

    #[test]
    fn test_stopword_only_role_scores_zero() {
        assert_eq!(score_role_match("the and", "of to in", "the resume"), 0);
    }

    #[test]
    fn test_empty_resume_scores_zero() {
        assert_eq!(score_role_match("Backend Developer", "Rust services", ""), 0);
    }

    #[test]
    fn test_perfect_match_scores_100() {
        assert_eq!(score_role_match("Rust Developer", "", "rust developer"), 100);
    }

    #[test]
    fn test_stem_match_scores_0_9() {
        // "testing" in the résumé stems to "test", matching vocabulary token "test".
        assert_eq!(score_role_match("", "test", "testing"), 90);
    }

    #[test]
    fn test_substring_match_scores_0_7() {
        // "java" is contained in "javascript".
        assert_eq!(score_role_match("", "java", "javascript"), 70);
    }

    #[test]
    fn test_fuzzy_overlap_scores_0_6() {
        // "kotlin" vs "kolint": same characters, different order.
        assert_eq!(score_role_match("", "kotlin", "kolint"), 60);
    }

    #[test]
    fn test_title_tokens_outweigh_description_tokens() {
        let title_hit = score_role_match("Plumber", "Welding", "plumber");
        let description_hit = score_role_match("Plumber", "Welding", "welding");
        assert_eq!(title_hit, 60); // 1.5 / 2.5
        assert_eq!(description_hit, 36); // stem match 0.9 × 1.0 / 2.5
        assert!(title_hit > description_hit);
    }

    #[test]
    fn test_score_is_idempotent_and_bounded() {
        let inputs = [
            ("", "", ""),
            ("Ünïcödé Rôle", "ÆØÅ résumé naïve", "naïve résumé"),
            ("!!!", "???", "..."),
            ("Data Scientist", "ML, NLP, statistics", "Statistician doing ml"),
        ];
        for (title, desc, resume) in inputs {
            let first = score_role_match(title, desc, resume);
            let second = score_role_match(title, desc, resume);
            assert_eq!(first, second);
            assert!(first <= 100);
        }
    }

    #[test]
    fn test_normalize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize("  C++/Rust,   Go!\n\tSQL "), "c rust go sql");
        assert_eq!(normalize("Café Naïve"), "café naïve");
    }

    #[test]
    fn test_stem_suffix_order() {
        assert_eq!(stem("running"), "runn");
        assert_eq!(stem("managed"), "manag");
        assert_eq!(stem("quickly"), "quick");
        assert_eq!(stem("uses"), "us");
        assert_eq!(stem("skills"), "skill");
        assert_eq!(stem("rust"), "rust");
    }
}
