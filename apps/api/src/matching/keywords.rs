//! Keyword-ratio matching: checks model-extracted role keywords against a résumé.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use crate::matching::role_score::stem;

const MIN_KEYWORD_LEN: usize = 3;

/// Common variants for multi-word AI/ML terms that a plain word match misses.
fn synonyms(keyword: &str) -> &'static [&'static str] {
    match keyword {
        "scikit-learn" => &["sklearn", "scikit learn"],
        "natural language processing" => &[
            "nlp",
            "natural-language processing",
            "natural-language-processing",
        ],
        "machine learning" => &["machine-learning"],
        "deep learning" => &["deep-learning"],
        "data preprocessing" => &["data pre-processing", "data pre processing"],
        "model training" => &["training models"],
        "model evaluation" => &["evaluate model", "model validation"],
        _ => &[],
    }
}

/// Lowercase, trim, drop entries shorter than three characters, dedupe in first-seen order.
pub fn normalize_keywords<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| k.chars().count() >= MIN_KEYWORD_LEN)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Tokens are maximal runs of ASCII letters, digits, `+`, `#` and `.` so that
/// `c++`, `f#.net` and `node.js` survive intact. Runs shorter than three
/// characters are dropped, the same floor `normalize_keywords` applies.
fn keyword_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .filter(|t| t.chars().count() >= MIN_KEYWORD_LEN)
}

fn word_bounded(phrase: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(phrase))).ok()
}

/// Word-bounded patterns for one keyword: the keyword itself, its
/// unhyphenated form, then its known synonyms.
fn phrase_patterns(keyword: &str) -> Vec<Regex> {
    let unhyphenated = keyword.replace('-', " ");
    let mut phrases = vec![keyword];
    if unhyphenated != keyword {
        phrases.push(&unhyphenated);
    }
    phrases.extend(synonyms(keyword));
    phrases.into_iter().filter_map(word_bounded).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    pub matching_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

impl KeywordMatch {
    pub fn total(&self) -> usize {
        self.matching_keywords.len() + self.missing_keywords.len()
    }

    /// `round(matched / total × 100)`, or `None` when there was nothing to match.
    pub fn ratio_score(&self) -> Option<u32> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let ratio = self.matching_keywords.len() as f64 / total as f64;
        Some((ratio * 100.0).round() as u32)
    }
}

/// Lookup structure built once per résumé and reused for every keyword.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    text: String,
    tokens: HashSet<String>,
    stems: HashSet<String>,
}

impl KeywordMatcher {
    /// `skills` are listed skill entries stored alongside the parsed text; each
    /// counts as a whole token.
    pub fn new(resume_text: &str, skills: &[String]) -> Self {
        let text = resume_text.to_lowercase();

        let mut tokens: HashSet<String> = skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| s.chars().count() >= MIN_KEYWORD_LEN)
            .collect();
        tokens.extend(keyword_tokens(&text).map(str::to_string));

        let stems = tokens.iter().map(|t| stem(t).to_string()).collect();

        Self { text, tokens, stems }
    }

    /// First rule that fires wins: exact token, stem (single words only),
    /// word-bounded phrase, hyphens read as spaces, then known synonyms.
    pub fn contains(&self, keyword: &str) -> bool {
        let k = keyword.trim().to_lowercase();
        if k.is_empty() {
            return false;
        }
        self.contains_token(&k) || self.contains_any(&phrase_patterns(&k))
    }

    fn contains_token(&self, k: &str) -> bool {
        self.tokens.contains(k) || (!k.contains(' ') && self.stems.contains(stem(k)))
    }

    fn contains_any(&self, patterns: &[Regex]) -> bool {
        patterns.iter().any(|re| re.is_match(&self.text))
    }

    /// Splits already-normalized keywords into matching and missing, preserving order.
    ///
    /// Phrase patterns are compiled once per distinct keyword and only for
    /// keywords the token lookup did not already settle.
    pub fn evaluate(&self, keywords: &[String]) -> KeywordMatch {
        let mut patterns: HashMap<&str, Vec<Regex>> = HashMap::new();
        let mut result = KeywordMatch::default();

        for keyword in keywords {
            let k = keyword.trim();
            let found = !k.is_empty()
                && (self.contains_token(k)
                    || self.contains_any(
                        patterns.entry(k).or_insert_with(|| phrase_patterns(k)),
                    ));
            if found {
                result.matching_keywords.push(keyword.clone());
            } else {
                result.missing_keywords.push(keyword.clone());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(text: &str) -> KeywordMatcher {
        KeywordMatcher::new(text, &[])
    }

    #[test]
    fn test_exact_token_keeps_symbols() {
        let m = matcher("Shipped services in C++ and F#.NET, frontends in Node.js");
        assert!(m.contains("c++"));
        assert!(m.contains("F#.NET"));
        assert!(m.contains("node.js"));
    }

    #[test]
    fn test_two_character_symbol_tokens_are_not_indexed() {
        let m = matcher("Shipped services in C#, Go and Rust");
        assert!(!m.contains("c#"));
        assert!(normalize_keywords(["C#", "go"]).is_empty());
    }

    #[test]
    fn test_evaluate_agrees_with_contains() {
        let m = matcher("Hands-on machine-learning with sklearn and real time dashboards");
        let keywords = normalize_keywords([
            "machine learning",
            "scikit-learn",
            "real-time",
            "machine learning",
            "kubernetes",
        ]);
        let result = m.evaluate(&keywords);
        for k in &result.matching_keywords {
            assert!(m.contains(k), "{k}");
        }
        for k in &result.missing_keywords {
            assert!(!m.contains(k), "{k}");
        }
        assert_eq!(
            result.matching_keywords,
            vec!["machine learning", "scikit-learn", "real-time"]
        );
        assert_eq!(result.missing_keywords, vec!["kubernetes"]);
    }

    #[test]
    fn test_single_word_stem_match() {
        let m = matcher("Led testing of payment flows");
        assert!(m.contains("tests"));
        assert!(!m.contains("payroll"));
    }

    #[test]
    fn test_phrase_needs_word_boundaries() {
        let m = matcher("Built data pipelines and REST APIs");
        assert!(m.contains("data pipelines"));
        assert!(m.contains("rest apis"));
        assert!(!m.contains("pipe"));
    }

    #[test]
    fn test_hyphen_variant_matches_spaced_text() {
        let m = matcher("Hands-on with real time analytics");
        assert!(m.contains("real-time"));
    }

    #[test]
    fn test_synonyms() {
        let m = matcher("Trained classifiers with sklearn; NLP for ticket routing");
        assert!(m.contains("scikit-learn"));
        assert!(m.contains("Natural Language Processing"));
        assert!(!m.contains("deep learning"));
    }

    #[test]
    fn test_skills_count_as_tokens() {
        let m = KeywordMatcher::new("Backend engineer", &["Kubernetes".to_string()]);
        assert!(m.contains("kubernetes"));
    }

    #[test]
    fn test_blank_keyword_never_matches() {
        assert!(!matcher("anything at all").contains("   "));
    }

    #[test]
    fn test_normalize_keywords_dedupes_and_drops_short() {
        let keywords = normalize_keywords([" Python ", "python", "Go", "SQL", "", "Docker"]);
        assert_eq!(keywords, vec!["python", "sql", "docker"]);
    }

    #[test]
    fn test_evaluate_and_ratio_score() {
        let m = matcher("Python developer using Django and PostgreSQL");
        let keywords = normalize_keywords(["python", "django", "kubernetes"]);
        let result = m.evaluate(&keywords);
        assert_eq!(result.matching_keywords, vec!["python", "django"]);
        assert_eq!(result.missing_keywords, vec!["kubernetes"]);
        assert_eq!(result.ratio_score(), Some(67));
    }

    #[test]
    fn test_ratio_score_empty_is_none() {
        assert_eq!(KeywordMatch::default().ratio_score(), None);
    }
}
